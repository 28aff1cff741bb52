//! Ethereum compatibility shim: accepts `eth_*` style calls and answers
//! them through the messenger with the chain's native prefix.

pub mod block;
pub mod net;
mod provider;
pub mod receipt;
pub mod web3;

pub use provider::{CompatOptions, CompatProvider, ETH_PREFIX};
