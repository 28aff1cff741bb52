use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::context::MessengerRef;
use crate::error::Result;
use crate::network::{Messenger, Subscription};

/// Ledger queries routed through the current messenger.
#[derive(Clone)]
pub struct Blockchain {
    messenger: MessengerRef,
}

impl Blockchain {
    pub fn new(messenger: MessengerRef) -> Self {
        Self { messenger }
    }

    pub fn messenger(&self) -> Arc<Messenger> {
        self.messenger.current()
    }

    async fn query(&self, method: &str, params: Vec<Value>, shard_id: Option<u32>) -> Result<Value> {
        let result = self
            .messenger
            .current()
            .send(method, params, None, shard_id)
            .await?
            .into_result()?;
        debug!("{} -> {}", method, result);
        Ok(result)
    }

    pub async fn get_balance(
        &self,
        address: &str,
        block_number: Option<&str>,
        shard_id: Option<u32>,
    ) -> Result<Value> {
        self.query(
            "getBalance",
            vec![json!(address), json!(block_number.unwrap_or("latest"))],
            shard_id,
        )
        .await
    }

    pub async fn get_block_number(&self, shard_id: Option<u32>) -> Result<Value> {
        self.query("blockNumber", Vec::new(), shard_id).await
    }

    pub async fn get_block_by_number(
        &self,
        block_number: &str,
        full_transactions: bool,
        shard_id: Option<u32>,
    ) -> Result<Value> {
        self.query(
            "getBlockByNumber",
            vec![json!(block_number), json!(full_transactions)],
            shard_id,
        )
        .await
    }

    pub async fn get_transaction_receipt(&self, tx_hash: &str, shard_id: Option<u32>) -> Result<Value> {
        self.query("getTransactionReceipt", vec![json!(tx_hash)], shard_id)
            .await
    }

    pub async fn get_transaction_count(
        &self,
        address: &str,
        block_number: Option<&str>,
        shard_id: Option<u32>,
    ) -> Result<Value> {
        self.query(
            "getTransactionCount",
            vec![json!(address), json!(block_number.unwrap_or("latest"))],
            shard_id,
        )
        .await
    }

    pub async fn get_code(
        &self,
        address: &str,
        block_number: Option<&str>,
        shard_id: Option<u32>,
    ) -> Result<Value> {
        self.query(
            "getCode",
            vec![json!(address), json!(block_number.unwrap_or("latest"))],
            shard_id,
        )
        .await
    }

    pub async fn gas_price(&self, shard_id: Option<u32>) -> Result<Value> {
        self.query("gasPrice", Vec::new(), shard_id).await
    }

    /// `net_version` as reported by the node.
    pub async fn net_version(&self, shard_id: Option<u32>) -> Result<Value> {
        self.query("net_version", Vec::new(), shard_id).await
    }

    /// Stream of new block headers. Requires a WebSocket provider.
    pub async fn new_block_headers(&self, shard_id: Option<u32>) -> Result<Subscription> {
        self.messenger
            .current()
            .subscribe("newHeads", Vec::new(), None, shard_id)
            .await
    }
}
