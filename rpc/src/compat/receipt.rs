use serde_json::Value;
use tracing::debug;

/// Status injected into every non-null receipt. Synthesized, not read from
/// the chain: the node's raw receipt may not carry a status at all.
pub const SYNTHETIC_STATUS: &str = "0x1";

/// Set `status` on a non-null receipt. A null receipt (not yet mined) is
/// left untouched.
pub fn inject_status(receipt: &mut Value) {
    if let Value::Object(fields) = receipt {
        fields.insert("status".to_string(), Value::String(SYNTHETIC_STATUS.to_string()));
        let hash = fields
            .get("transactionHash")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        debug!("Receipt {} given synthetic status {}", hash, SYNTHETIC_STATUS);
    }
}
