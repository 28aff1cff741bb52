use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AstraError;

/// RPC namespace convention spoken by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    #[default]
    Astra,
    Eth,
}

impl ChainType {
    /// Method-name namespace token for this chain (`astra` / `eth`).
    pub fn prefix(&self) -> &'static str {
        match self {
            ChainType::Astra => "astra",
            ChainType::Eth => "eth",
        }
    }

    /// True when `namespace` is a chain namespace that gets rewritten
    /// to the active prefix.
    pub fn is_chain_namespace(namespace: &str) -> bool {
        namespace == ChainType::Astra.prefix() || namespace == ChainType::Eth.prefix()
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for ChainType {
    type Err = AstraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "astra" => Ok(ChainType::Astra),
            "eth" => Ok(ChainType::Eth),
            other => Err(AstraError::MalformedConfig(format!(
                "unknown chain type '{}' (expected 'astra' or 'eth')",
                other
            ))),
        }
    }
}

/// Numeric chain id. Several networks share values, hence constants
/// rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const DEFAULT: ChainId = ChainId(0);
    pub const ETH_MAINNET: ChainId = ChainId(1);
    pub const MORDEN: ChainId = ChainId(2);
    pub const ROPSTEN: ChainId = ChainId(3);
    pub const RINKEBY: ChainId = ChainId(4);
    pub const ROOTSTOCK_MAINNET: ChainId = ChainId(30);
    pub const ROOTSTOCK_TESTNET: ChainId = ChainId(31);
    pub const KOVAN: ChainId = ChainId(42);
    pub const ETC_MAINNET: ChainId = ChainId(61);
    pub const ETC_TESTNET: ChainId = ChainId(62);
    pub const GETH: ChainId = ChainId(1337);
    pub const GANACHE: ChainId = ChainId(0);
    pub const ASTRA_MAINNET: ChainId = ChainId(1);
    pub const ASTRA_TESTNET: ChainId = ChainId(2);
    pub const ASTRA_LOCAL: ChainId = ChainId(2);
    pub const ASTRA_PANGAEA: ChainId = ChainId(3);

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Chain id as a 0x-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl Default for ChainId {
    fn default() -> Self {
        ChainId::ASTRA_LOCAL
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        ChainId(value)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chain type and chain id, owned by the messenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainIdentity {
    pub chain_type: ChainType,
    pub chain_id: ChainId,
}

impl ChainIdentity {
    pub fn new(chain_type: ChainType, chain_id: ChainId) -> Self {
        Self {
            chain_type,
            chain_id,
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.chain_type.prefix()
    }
}
