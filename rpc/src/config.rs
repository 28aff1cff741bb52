use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::chain::{ChainId, ChainType};
use crate::compat::CompatOptions;
use crate::network::ShardingItem;

/// Default node endpoint used when nothing else is configured.
pub const DEFAULT_CHAIN_URL: &str = "http://localhost:9500";

/// Construction-time configuration of an [`crate::Astra`] instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AstraConfig {
    /// Overrides the URL passed to the constructor.
    pub chain_url: Option<String>,
    pub chain_type: ChainType,
    pub chain_id: ChainId,
    /// Default shard for calls that name none.
    pub shard_id: Option<u32>,
}

impl Default for AstraConfig {
    fn default() -> Self {
        Self {
            chain_url: None,
            chain_type: ChainType::Astra,
            chain_id: ChainId::ASTRA_LOCAL,
            shard_id: None,
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Node RPC endpoint (http, https, ws or wss)
    pub chain_url: String,
    pub chain_type: ChainType,
    pub chain_id: ChainId,
    /// Default shard id
    pub shard_id: u32,
    /// Sharding structure, JSON array of `{shardID, current, http, ws}`
    pub sharding: Vec<ShardingItem>,
    /// RPC server port
    pub rpc_port: u16,
    /// Block gas limit ceiling, decimal or 0x hex
    pub gas_limit: String,
    /// Gas price filled into unsigned transactions, decimal or 0x hex
    pub gas_price: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Call dotenvy::dotenv() before calling this.
    pub fn from_env() -> Result<Self> {
        let chain_url =
            env::var("ASTRA_CHAIN_URL").unwrap_or_else(|_| DEFAULT_CHAIN_URL.to_string());

        let chain_type: ChainType = env::var("ASTRA_CHAIN_TYPE")
            .unwrap_or_else(|_| "astra".to_string())
            .parse()
            .context("ASTRA_CHAIN_TYPE must be 'astra' or 'eth'")?;

        let chain_id: u64 = env::var("ASTRA_CHAIN_ID")
            .unwrap_or_else(|_| ChainId::ASTRA_LOCAL.value().to_string())
            .parse()
            .context("ASTRA_CHAIN_ID must be a valid u64")?;

        let shard_id: u32 = env::var("ASTRA_SHARD_ID")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("ASTRA_SHARD_ID must be a valid u32")?;

        let sharding = parse_sharding(&env::var("ASTRA_SHARDING").unwrap_or_default())?;

        let rpc_port: u16 = env::var("ASTRA_RPC_PORT")
            .unwrap_or_else(|_| "8545".to_string())
            .parse()
            .context("ASTRA_RPC_PORT must be a valid u16")?;

        let gas_limit = env::var("ASTRA_GAS_LIMIT").unwrap_or_else(|_| "10000000".to_string());
        let gas_price = env::var("ASTRA_GAS_PRICE").unwrap_or_else(|_| "20000000000".to_string());

        Ok(Config {
            chain_url,
            chain_type,
            chain_id: ChainId(chain_id),
            shard_id,
            sharding,
            rpc_port,
            gas_limit,
            gas_price,
        })
    }

    pub fn astra_config(&self) -> AstraConfig {
        AstraConfig {
            chain_url: Some(self.chain_url.clone()),
            chain_type: self.chain_type,
            chain_id: self.chain_id,
            shard_id: Some(self.shard_id),
        }
    }

    /// Shim options; fails on a malformed gas limit or price.
    pub fn compat_options(&self) -> Result<CompatOptions> {
        CompatOptions::new(&self.gas_limit, &self.gas_price, env!("CARGO_PKG_VERSION"))
            .context("ASTRA_GAS_LIMIT and ASTRA_GAS_PRICE must be decimal or 0x hex")
    }
}

/// `ASTRA_SHARDING` value; blank means no sharding structure.
fn parse_sharding(raw: &str) -> Result<Vec<ShardingItem>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("ASTRA_SHARDING must be a JSON array of sharding items")
}
