//! Astra RPC client stack
//!
//! A messenger façade over HTTP and WebSocket JSON-RPC transports for
//! Astra-family nodes, plus an Ethereum compatibility shim so that tooling
//! speaking `eth_*` can talk to an Astra node through it.
//!
//! # Architecture
//!
//! ```text
//! Caller (ethers-style tooling)
//!     |
//!     | eth_* JSON-RPC calls
//!     v
//! CompatProvider (optional)
//!     |
//!     v
//! Messenger -> ProviderHandle (HTTP | WS) -> Astra node
//! ```
//!
//! # Modules
//!
//! - `config` - Environment and construction-time configuration
//! - `network` - Messenger, transports, shard table and wire types
//! - `context` - Single owner of the messenger configuration
//! - `astra` / `extension` - Composition roots
//! - `blockchain`, `transaction`, `wallet` - Modules that send through the messenger
//! - `compat` - Ethereum compatibility shim
//! - `server` - Local JSON-RPC server for the shim

pub mod astra;
pub mod blockchain;
pub mod chain;
pub mod compat;
pub mod config;
pub mod context;
pub mod error;
pub mod extension;
pub mod network;
pub mod server;
pub mod signer;
pub mod transaction;
pub mod wallet;

pub use astra::Astra;
pub use chain::{ChainId, ChainType};
pub use compat::{CompatOptions, CompatProvider};
pub use config::AstraConfig;
pub use error::{AstraError, Result};
pub use extension::AstraExtension;
pub use network::Messenger;
