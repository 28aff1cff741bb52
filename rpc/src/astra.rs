use std::sync::Arc;

use tracing::info;

use crate::blockchain::Blockchain;
use crate::chain::{ChainId, ChainType};
use crate::compat::{CompatOptions, CompatProvider};
use crate::config::{AstraConfig, DEFAULT_CHAIN_URL};
use crate::context::MessengerContext;
use crate::error::Result;
use crate::network::{Endpoint, Messenger, ProviderHandle, ShardingItem};
use crate::signer::{EmptyKeyring, Keyring};
use crate::transaction::{StakingFactory, TransactionFactory};
use crate::wallet::Wallet;

/// Composition root: one messenger shared by every sub-module.
///
/// Setters publish a new messenger snapshot that all sub-modules observe on
/// their next call.
pub struct Astra {
    context: MessengerContext,
    pub blockchain: Blockchain,
    pub transactions: TransactionFactory,
    pub stakings: StakingFactory,
    pub wallet: Wallet,
}

impl Astra {
    /// Connect to `url`, or to `config.chain_url` when set.
    pub fn new(url: Option<&str>, config: AstraConfig) -> Result<Self> {
        let url = config
            .chain_url
            .as_deref()
            .or(url)
            .unwrap_or(DEFAULT_CHAIN_URL);
        let provider = ProviderHandle::from_url(url)?;
        Ok(Self::with_provider(provider, config))
    }

    pub fn with_provider(provider: ProviderHandle, config: AstraConfig) -> Self {
        let mut messenger = Messenger::new(provider, config.chain_type, config.chain_id);
        if let Some(shard_id) = config.shard_id {
            messenger.set_default_shard_id(shard_id);
        }
        info!(
            "Astra bound to {} ({} chain id {})",
            messenger.provider().endpoint(),
            config.chain_type,
            config.chain_id
        );

        let context = MessengerContext::new(messenger);
        Self {
            blockchain: Blockchain::new(context.handle()),
            transactions: TransactionFactory::new(context.handle()),
            stakings: StakingFactory::new(context.handle()),
            wallet: Wallet::new(context.handle(), Arc::new(EmptyKeyring)),
            context,
        }
    }

    /// Replace the wallet's keyring.
    pub fn with_keyring(mut self, keyring: Arc<dyn Keyring>) -> Self {
        self.wallet = Wallet::new(self.context.handle(), keyring);
        self
    }

    /// Current messenger snapshot.
    pub fn messenger(&self) -> Arc<Messenger> {
        self.context.current()
    }

    pub fn context(&self) -> &MessengerContext {
        &self.context
    }

    pub fn set_provider(&self, endpoint: impl Into<Endpoint>) -> Result<()> {
        let endpoint = endpoint.into();
        self.context.update(|m| m.set_provider(endpoint))
    }

    pub fn set_chain_id(&self, chain_id: ChainId) -> Result<()> {
        self.context.update(|m| {
            m.set_chain_id(chain_id);
            Ok(())
        })
    }

    pub fn set_chain_type(&self, chain_type: ChainType) -> Result<()> {
        self.context.update(|m| {
            m.set_chain_type(chain_type);
            Ok(())
        })
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

    /// Ethereum compatibility shim over this instance's messenger and keyring.
    pub fn compat_provider(&self, options: CompatOptions) -> CompatProvider {
        CompatProvider::new(self.context.handle(), self.wallet.keyring().clone(), options)
    }
}
