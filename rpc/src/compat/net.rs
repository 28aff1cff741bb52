use serde_json::Value;
use tracing::debug;

use crate::network::Messenger;

/// Handler for net_version
/// Returns the configured chain id as a decimal string; no round trip.
pub fn version(messenger: &Messenger) -> Value {
    let version = messenger.chain_id().to_string();
    debug!("net_version -> {}", version);
    Value::String(version)
}
