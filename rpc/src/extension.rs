use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::blockchain::Blockchain;
use crate::config::AstraConfig;
use crate::context::MessengerContext;
use crate::error::{AstraError, Result};
use crate::network::{Endpoint, Messenger, ProviderHandle, ShardingItem};
use crate::signer::{AccountService, Identity, Keyring};
use crate::transaction::TransactionFactory;
use crate::wallet::{parse_quantity, shard_of, SignOptions};

/// Supported injected wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionType {
    MathWallet,
    OneWallet,
}

/// Network the extension is currently pointed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionNetwork {
    pub chain_url: String,
    pub net_version: u64,
}

/// Injected browser-style wallet.
#[async_trait]
pub trait WalletExtension: AccountService {
    /// `None` when the object is not a recognised extension.
    fn kind(&self) -> Option<ExtensionType>;

    fn network(&self) -> ExtensionNetwork;

    /// Messenger the extension already carries, if any.
    fn messenger(&self) -> Option<Messenger> {
        None
    }
}

/// Composition root for an injected wallet extension.
pub struct AstraExtension {
    extension_type: ExtensionType,
    extension: Arc<dyn WalletExtension>,
    keyring: Arc<dyn Keyring>,
    context: MessengerContext,
    pub blockchain: Blockchain,
    pub transactions: TransactionFactory,
}

impl AstraExtension {
    pub fn new(
        extension: Arc<dyn WalletExtension>,
        keyring: Arc<dyn Keyring>,
        config: AstraConfig,
    ) -> Result<Self> {
        let extension_type = extension
            .kind()
            .ok_or_else(|| AstraError::UnsupportedOperation("extension is not found".to_string()))?;

        let messenger = match extension.messenger() {
            Some(messenger) => messenger,
            None => {
                let url = config
                    .chain_url
                    .clone()
                    .unwrap_or_else(|| extension.network().chain_url);
                let mut messenger = Messenger::new(
                    ProviderHandle::from_url(&url)?,
                    config.chain_type,
                    config.chain_id,
                );
                if let Some(shard_id) = config.shard_id {
                    messenger.set_default_shard_id(shard_id);
                }
                messenger
            }
        };
        info!(
            "{:?} extension bound to {}",
            extension_type,
            messenger.provider().endpoint()
        );

        let context = MessengerContext::new(messenger);
        Ok(Self {
            extension_type,
            extension,
            keyring,
            blockchain: Blockchain::new(context.handle()),
            transactions: TransactionFactory::new(context.handle()),
            context,
        })
    }

    pub fn extension_type(&self) -> ExtensionType {
        self.extension_type
    }

    pub fn messenger(&self) -> Arc<Messenger> {
        self.context.current()
    }

    pub async fn login(&self) -> Result<Identity> {
        let account = self.extension.get_account().await?;
        info!("Extension login: {}", account.address);
        Ok(account)
    }

    pub async fn logout(&self) -> Result<()> {
        self.extension.forget_identity().await
    }

    pub fn set_provider(&self, endpoint: impl Into<Endpoint>) -> Result<()> {
        let endpoint = endpoint.into();
        self.context.update(|m| m.set_provider(endpoint))
    }

    pub fn set_shard_id(&self, shard_id: u32) -> Result<()> {
        self.context.update(|m| {
            m.set_default_shard_id(shard_id);
            Ok(())
        })
    }

    pub fn set_sharding_structures(&self, items: &[ShardingItem]) -> Result<()> {
        self.context.update(|m| m.set_sharding_structures(items))
    }

    /// Sign as the extension's account. With `update_nonce`, the nonce is
    /// fetched on the transaction's shard first.
    pub async fn sign_transaction(&self, mut transaction: Value, options: &SignOptions) -> Result<String> {
        let account = self.extension.get_account().await?;
        let tx = transaction
            .as_object_mut()
            .ok_or_else(|| AstraError::Signing("transaction must be a JSON object".to_string()))?;
        tx.insert("from".to_string(), json!(account.address));

        if options.update_nonce {
            let messenger = self.context.current();
            let shard_id = match tx.get("shardID") {
                Some(value) => Some(shard_of(Some(value))?),
                None => None,
            };
            let nonce = messenger
                .send(
                    "getTransactionCount",
                    vec![json!(account.address), json!(options.block_number)],
                    Some(messenger.chain_prefix()),
                    shard_id,
                )
                .await?
                .into_result()?;
            let nonce = parse_quantity(&nonce)?;
            debug!("Extension nonce for {}: {}", account.address, nonce);
            tx.insert("nonce".to_string(), json!(nonce));
        }

        self.keyring.sign(&transaction).await
    }
}
