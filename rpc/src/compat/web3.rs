use serde_json::Value;
use tracing::debug;

/// Handler for web3_clientVersion
/// Returns the locally composed client version string; no round trip.
pub fn client_version(version: &str) -> Value {
    let version = format!("Astra/{}/@astra-js", version);
    debug!("web3_clientVersion -> {}", version);
    Value::String(version)
}
