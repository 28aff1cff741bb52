use serde_json::Value;
use tracing::info;

use crate::context::MessengerRef;
use crate::error::{AstraError, Result};

/// Check that `raw_tx` is 0x-prefixed (or bare) hex before it leaves the process.
fn validate_raw(raw_tx: &str) -> Result<()> {
    let body = raw_tx.strip_prefix("0x").unwrap_or(raw_tx);
    if body.is_empty() {
        return Err(AstraError::MalformedConfig("empty raw transaction".to_string()));
    }
    hex::decode(body)
        .map(|_| ())
        .map_err(|e| AstraError::MalformedConfig(format!("raw transaction is not hex: {}", e)))
}

async fn submit_raw(
    messenger: &MessengerRef,
    method: &str,
    raw_tx: &str,
    shard_id: Option<u32>,
) -> Result<Value> {
    validate_raw(raw_tx)?;
    let messenger = messenger.current();
    let result = messenger
        .send(method, vec![Value::String(raw_tx.to_string())], None, shard_id)
        .await?
        .into_result()?;
    info!(
        "{}: submitted {} bytes on shard {} -> {}",
        method,
        raw_tx.len() / 2,
        messenger.route_shard(shard_id),
        result
    );
    Ok(result)
}

/// Submission of signed, encoded transactions.
#[derive(Clone)]
pub struct TransactionFactory {
    messenger: MessengerRef,
}

impl TransactionFactory {
    pub fn new(messenger: MessengerRef) -> Self {
        Self { messenger }
    }

    /// Submit through `{prefix}_sendRawTransaction`; returns the transaction hash.
    pub async fn send_signed(&self, raw_tx: &str, shard_id: Option<u32>) -> Result<Value> {
        submit_raw(&self.messenger, "sendRawTransaction", raw_tx, shard_id).await
    }
}

/// Submission of signed, encoded staking transactions.
#[derive(Clone)]
pub struct StakingFactory {
    messenger: MessengerRef,
}

impl StakingFactory {
    pub fn new(messenger: MessengerRef) -> Self {
        Self { messenger }
    }

    /// Submit through `{prefix}_sendRawStakingTransaction`.
    pub async fn send_signed(&self, raw_tx: &str, shard_id: Option<u32>) -> Result<Value> {
        submit_raw(&self.messenger, "sendRawStakingTransaction", raw_tx, shard_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_raw() {
        assert!(validate_raw("0xf86c").is_ok());
        assert!(validate_raw("f86c").is_ok());
        assert!(matches!(validate_raw("0x"), Err(AstraError::MalformedConfig(_))));
        assert!(matches!(validate_raw("0xzz"), Err(AstraError::MalformedConfig(_))));
    }
}
