use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the messenger, its transports and the compatibility shim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AstraError {
    /// Network or provider failure (connect, HTTP status, closed socket, id mismatch).
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// Operation not available on the bound transport (e.g. subscribe over HTTP).
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No signing identity is held for the requested address.
    #[error("No signing identity available{}", .0.as_ref().map(|a| format!(" for {}", a)).unwrap_or_default())]
    IdentityNotFound(Option<String>),

    /// Unparseable shard id, endpoint, or other configuration value.
    #[error("Malformed config: {0}")]
    MalformedConfig(String),

    /// The signing collaborator rejected or failed to sign a transaction.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Node payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, AstraError>;

impl From<reqwest::Error> for AstraError {
    fn from(err: reqwest::Error) -> Self {
        AstraError::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AstraError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AstraError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AstraError {
    fn from(err: serde_json::Error) -> Self {
        AstraError::Decode(err.to_string())
    }
}
