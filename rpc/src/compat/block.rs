use num_bigint::BigUint;
use num_traits::Num;
use serde_json::Value;
use tracing::{debug, warn};

/// Block field compared against the configured ceiling.
pub const GAS_LIMIT_FIELD: &str = "gasLimit";

/// Parse a `0x`-prefixed hex quantity of any size.
pub fn parse_hex_quantity(raw: &str) -> Option<BigUint> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    BigUint::from_str_radix(digits, 16).ok()
}

/// Parse a quantity given either as `0x` hex or as a decimal string.
pub fn parse_quantity(raw: &str) -> Option<BigUint> {
    let raw = raw.trim();
    if raw.starts_with("0x") || raw.starts_with("0X") {
        parse_hex_quantity(raw)
    } else {
        BigUint::from_str_radix(raw, 10).ok()
    }
}

/// Encode a quantity as `0x` hex.
pub fn to_hex_quantity(value: &BigUint) -> String {
    format!("0x{:x}", value)
}

/// Clamp the block's `gasLimit` down to `ceiling`. Returns true when clamped.
///
/// A null block, a missing field, or a value that is not hex passes through.
pub fn clamp_gas_limit(block: &mut Value, ceiling: &BigUint) -> bool {
    let Some(raw) = block.get(GAS_LIMIT_FIELD).and_then(Value::as_str) else {
        return false;
    };

    let Some(gas_limit) = parse_hex_quantity(raw) else {
        warn!("Block gasLimit '{}' is not a hex quantity, leaving it as is", raw);
        return false;
    };

    if gas_limit <= *ceiling {
        return false;
    }

    let clamped = to_hex_quantity(ceiling);
    debug!("Clamping block gasLimit {} -> {}", raw, clamped);
    block[GAS_LIMIT_FIELD] = Value::String(clamped);
    true
}
