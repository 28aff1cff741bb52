use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::http::HttpProvider;
use super::messenger::Subscription;
use super::types::{RpcRequest, RpcResponse};
use super::ws::WsProvider;
use crate::error::{AstraError, Result};

/// Unary request/response transport.
///
/// Implementations correlate each response with its request id; they do not
/// order concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse>;

    /// Endpoint this transport talks to, for logging and response metadata.
    fn endpoint(&self) -> &str;
}

/// Transport that also carries server-pushed subscription streams.
#[async_trait]
pub trait StreamingTransport: Transport {
    /// Issue `request` (a `{prefix}_subscribe` call) and return the live stream
    /// of notifications bound to the subscription id the node hands back.
    async fn subscribe(&self, request: RpcRequest) -> Result<Subscription>;
}

/// Bound transport, one of the two supported kinds.
///
/// Handles are replaced, never mutated; requests already issued on a superseded
/// handle keep their own `Arc` and finish independently.
#[derive(Clone)]
pub enum ProviderHandle {
    Http(Arc<dyn Transport>),
    Ws(Arc<dyn StreamingTransport>),
}

impl ProviderHandle {
    /// Resolve a URL by scheme: `http`/`https` -> HTTP, `ws`/`wss` -> WS.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| AstraError::MalformedConfig(format!("invalid endpoint '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(ProviderHandle::Http(Arc::new(HttpProvider::new(raw)))),
            "ws" | "wss" => Ok(ProviderHandle::Ws(Arc::new(WsProvider::new(raw)))),
            scheme => Err(AstraError::MalformedConfig(format!(
                "unsupported endpoint scheme '{}' in '{}'",
                scheme, raw
            ))),
        }
    }

    pub fn is_ws(&self) -> bool {
        matches!(self, ProviderHandle::Ws(_))
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ProviderHandle::Http(t) => t.endpoint(),
            ProviderHandle::Ws(t) => t.endpoint(),
        }
    }

    pub async fn request(&self, request: RpcRequest) -> Result<RpcResponse> {
        debug!(
            "-> {} id={} via {}",
            request.method,
            request.id,
            self.endpoint()
        );
        match self {
            ProviderHandle::Http(t) => t.request(request).await,
            ProviderHandle::Ws(t) => t.request(request).await,
        }
    }

    /// Open a subscription. Fails before any network call on an HTTP handle.
    pub async fn subscribe(&self, request: RpcRequest) -> Result<Subscription> {
        match self {
            ProviderHandle::Ws(t) => t.subscribe(request).await,
            ProviderHandle::Http(t) => Err(AstraError::UnsupportedOperation(format!(
                "subscribe requires a WebSocket provider, bound to {}",
                t.endpoint()
            ))),
        }
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderHandle::Http(t) => write!(f, "Http({})", t.endpoint()),
            ProviderHandle::Ws(t) => write!(f, "Ws({})", t.endpoint()),
        }
    }
}

/// What `set_provider` accepts: a URL to resolve, or a pre-built handle.
#[derive(Debug, Clone)]
pub enum Endpoint {
    Url(String),
    Handle(ProviderHandle),
}

impl Endpoint {
    pub fn resolve(self) -> Result<ProviderHandle> {
        match self {
            Endpoint::Url(url) => ProviderHandle::from_url(&url),
            Endpoint::Handle(handle) => Ok(handle),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Endpoint::Url(value.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(value: String) -> Self {
        Endpoint::Url(value)
    }
}

impl From<ProviderHandle> for Endpoint {
    fn from(value: ProviderHandle) -> Self {
        Endpoint::Handle(value)
    }
}
