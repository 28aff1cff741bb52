use std::sync::Arc;

use num_bigint::BigUint;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{block, net, receipt, web3};
use crate::context::MessengerRef;
use crate::error::{AstraError, Result};
use crate::network::{Messenger, RpcRequest, RpcResponse};
use crate::signer::Keyring;
use crate::wallet::{shard_of, SignOptions, Wallet};

/// Generic Ethereum namespace rewritten by the shim.
pub const ETH_PREFIX: &str = "eth";

/// Local settings of the compatibility shim.
#[derive(Debug, Clone)]
pub struct CompatOptions {
    gas_limit: BigUint,
    gas_price: BigUint,
    client_version: String,
}

impl CompatOptions {
    /// `gas_limit` and `gas_price` accept decimal or `0x` hex.
    pub fn new(gas_limit: &str, gas_price: &str, client_version: &str) -> Result<Self> {
        let gas_limit = block::parse_quantity(gas_limit).ok_or_else(|| {
            AstraError::MalformedConfig(format!("invalid gas limit '{}'", gas_limit))
        })?;
        let gas_price = block::parse_quantity(gas_price).ok_or_else(|| {
            AstraError::MalformedConfig(format!("invalid gas price '{}'", gas_price))
        })?;
        Ok(Self {
            gas_limit,
            gas_price,
            client_version: client_version.to_string(),
        })
    }

    /// Ceiling applied to block gas limits and default transaction gas.
    pub fn gas_limit(&self) -> &BigUint {
        &self.gas_limit
    }

    pub fn gas_price(&self) -> &BigUint {
        &self.gas_price
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }
}

impl Default for CompatOptions {
    fn default() -> Self {
        Self {
            gas_limit: BigUint::from(10_000_000u64),
            gas_price: BigUint::from(20_000_000_000u64),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Ethereum-convention front end over the messenger.
///
/// [`CompatProvider::request`] is the single source of truth for every call;
/// [`CompatProvider::send`] adapts it to the legacy `(error, response)`
/// callback and returns the very same outcome.
#[derive(Clone)]
pub struct CompatProvider {
    messenger: MessengerRef,
    wallet: Wallet,
    options: CompatOptions,
}

impl CompatProvider {
    pub fn new(messenger: MessengerRef, keyring: Arc<dyn Keyring>, options: CompatOptions) -> Self {
        let wallet = Wallet::new(messenger.clone(), keyring);
        Self {
            messenger,
            wallet,
            options,
        }
    }

    pub fn options(&self) -> &CompatOptions {
        &self.options
    }

    pub fn messenger(&self) -> Arc<Messenger> {
        self.messenger.current()
    }

    /// Rewrite the generic `eth` prefix to the chain's native prefix.
    pub fn rewrite_method(&self, method: &str) -> String {
        match method.strip_prefix(ETH_PREFIX) {
            Some(rest) => format!("{}{}", self.messenger.current().chain_prefix(), rest),
            None => method.to_string(),
        }
    }

    /// Handle one call and produce its normalized response.
    pub async fn request(&self, payload: RpcRequest) -> Result<RpcResponse> {
        let caller_id = payload.id;
        let method = self.rewrite_method(&payload.method);
        let messenger = self.messenger.current();
        let prefix = messenger.chain_prefix();
        debug!("shim: {} -> {} (id={})", payload.method, method, caller_id);

        let native = match method.split_once('_') {
            Some((namespace, name)) if namespace == prefix => Some(name),
            _ => None,
        };

        let outcome = match (native, method.as_str()) {
            (Some("accounts"), _) => Ok(RpcResponse::success(caller_id, json!(self.wallet.accounts()))),
            (Some("sendTransaction"), _) => self.send_transaction(&messenger, payload.params).await,
            (Some("getTransactionReceipt"), _) => {
                self.forward(&messenger, &method, payload.params)
                    .await
                    .and_then(|response| {
                        let mut result = response.into_result()?;
                        receipt::inject_status(&mut result);
                        Ok(RpcResponse::success(caller_id, result))
                    })
            }
            (Some("getBlockByNumber"), _) => {
                self.forward(&messenger, &method, payload.params)
                    .await
                    .and_then(|response| {
                        let mut result = response.into_result()?;
                        block::clamp_gas_limit(&mut result, &self.options.gas_limit);
                        Ok(RpcResponse::success(caller_id, result))
                    })
            }
            (_, "net_version") => Ok(RpcResponse::success(caller_id, net::version(&messenger))),
            (_, "web3_clientVersion") => Ok(RpcResponse::success(
                caller_id,
                web3::client_version(&self.options.client_version),
            )),
            _ => self.forward(&messenger, &method, payload.params).await,
        };

        match outcome {
            Ok(mut response) => {
                response.id = caller_id;
                Ok(response)
            }
            Err(e) => {
                error!("shim: {} failed: {}", method, e);
                Err(e)
            }
        }
    }

    /// Legacy entry point: `callback` sees exactly the outcome that is returned.
    pub async fn send<F>(&self, payload: RpcRequest, callback: F) -> Result<RpcResponse>
    where
        F: FnOnce(Option<&AstraError>, Option<&RpcResponse>) + Send,
    {
        let outcome = self.request(payload).await;
        match &outcome {
            Ok(response) => callback(None, Some(response)),
            Err(err) => callback(Some(err), None),
        }
        outcome
    }

    /// Alias of [`CompatProvider::send`] for tooling that calls `sendAsync`.
    pub async fn send_async<F>(&self, payload: RpcRequest, callback: F) -> Result<RpcResponse>
    where
        F: FnOnce(Option<&AstraError>, Option<&RpcResponse>) + Send,
    {
        self.send(payload, callback).await
    }

    /// Default path: forward unchanged params, strip transport metadata.
    async fn forward(&self, messenger: &Messenger, method: &str, params: Vec<Value>) -> Result<RpcResponse> {
        Ok(messenger.send(method, params, None, None).await?.into_raw())
    }

    /// Sign locally, then submit through the native raw-transaction method.
    async fn send_transaction(&self, messenger: &Messenger, params: Vec<Value>) -> Result<RpcResponse> {
        let mut transaction = params
            .into_iter()
            .next()
            .filter(Value::is_object)
            .ok_or_else(|| {
                AstraError::Signing("sendTransaction requires a transaction object".to_string())
            })?;

        let shard_id = match transaction.get("shardID") {
            Some(value) => Some(shard_of(Some(value))?),
            None => None,
        };

        if let Some(tx) = transaction.as_object_mut() {
            if !tx.contains_key("gas") && !tx.contains_key("gasLimit") {
                tx.insert(
                    "gasLimit".to_string(),
                    json!(block::to_hex_quantity(&self.options.gas_limit)),
                );
            }
            if !tx.contains_key("gasPrice") {
                tx.insert(
                    "gasPrice".to_string(),
                    json!(block::to_hex_quantity(&self.options.gas_price)),
                );
            }
        }

        let raw_tx = self
            .wallet
            .sign_transaction(transaction, &SignOptions::offline())
            .await?;
        info!("shim: submitting signed transaction ({} hex chars)", raw_tx.len());

        let response = messenger
            .send(
                "sendRawTransaction",
                vec![Value::String(raw_tx)],
                Some(messenger.chain_prefix()),
                shard_id,
            )
            .await?;
        Ok(response.into_raw())
    }
}
