use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::context::MessengerRef;
use crate::error::{AstraError, Result};
use crate::network::Messenger;
use crate::signer::Keyring;

/// How a transaction is prepared before it reaches the keyring.
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Refresh `nonce` from the node before signing.
    pub update_nonce: bool,
    /// Block tag for the nonce lookup.
    pub block_number: String,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            update_nonce: true,
            block_number: "latest".to_string(),
        }
    }
}

impl SignOptions {
    /// Sign as given, no network round trip.
    pub fn offline() -> Self {
        Self {
            update_nonce: false,
            ..Self::default()
        }
    }
}

/// Signing wallet bound to the current messenger.
#[derive(Clone)]
pub struct Wallet {
    messenger: MessengerRef,
    keyring: Arc<dyn Keyring>,
}

impl Wallet {
    pub fn new(messenger: MessengerRef, keyring: Arc<dyn Keyring>) -> Self {
        Self { messenger, keyring }
    }

    pub fn messenger(&self) -> Arc<Messenger> {
        self.messenger.current()
    }

    pub fn keyring(&self) -> &Arc<dyn Keyring> {
        &self.keyring
    }

    pub fn accounts(&self) -> Vec<String> {
        self.keyring.accounts()
    }

    /// Signing identity for `transaction`: its `from` when held, else the
    /// first held account.
    pub fn resolve_signer(&self, transaction: &Value) -> Result<String> {
        match transaction.get("from").and_then(Value::as_str) {
            Some(from) if self.keyring.holds(from) => Ok(from.to_string()),
            Some(from) => Err(AstraError::IdentityNotFound(Some(from.to_string()))),
            None => self
                .keyring
                .accounts()
                .into_iter()
                .next()
                .ok_or(AstraError::IdentityNotFound(None)),
        }
    }

    /// Fill chain context, resolve the signer, optionally refresh the nonce,
    /// then hand the transaction to the keyring. Returns the raw signed hex.
    pub async fn sign_transaction(&self, mut transaction: Value, options: &SignOptions) -> Result<String> {
        let from = self.resolve_signer(&transaction)?;
        let messenger = self.messenger.current();

        let tx = transaction
            .as_object_mut()
            .ok_or_else(|| AstraError::Signing("transaction must be a JSON object".to_string()))?;
        tx.insert("from".to_string(), json!(from));
        tx.entry("chainId")
            .or_insert_with(|| json!(messenger.chain_id().value()));
        tx.entry("shardID")
            .or_insert_with(|| json!(messenger.current_shard_id()));
        let shard_id = shard_of(tx.get("shardID"))?;
        tx.entry("toShardID").or_insert_with(|| json!(shard_id));

        if options.update_nonce {
            let nonce = messenger
                .send(
                    "getTransactionCount",
                    vec![json!(from), json!(options.block_number)],
                    None,
                    Some(shard_id),
                )
                .await?
                .into_result()?;
            let nonce = parse_quantity(&nonce)?;
            debug!("Nonce for {} on shard {}: {}", from, shard_id, nonce);
            tx.insert("nonce".to_string(), json!(nonce));
        }

        self.keyring.sign(&transaction).await
    }
}

/// Shard id from a transaction field that may be a number or a decimal string.
pub(crate) fn shard_of(value: Option<&Value>) -> Result<u32> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| AstraError::MalformedConfig(format!("invalid shardID {}", n))),
        Some(Value::String(s)) => s
            .parse::<u32>()
            .map_err(|e| AstraError::MalformedConfig(format!("invalid shardID '{}': {}", s, e))),
        Some(other) => Err(AstraError::MalformedConfig(format!("invalid shardID {}", other))),
    }
}

/// Parse a JSON-RPC quantity: `0x` hex string, decimal string, or number.
pub(crate) fn parse_quantity(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| AstraError::Decode(format!("quantity out of range: {}", n))),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        }
        .map_err(|e| AstraError::Decode(format!("invalid quantity '{}': {}", s, e))),
        other => Err(AstraError::Decode(format!("invalid quantity {}", other))),
    }
}
