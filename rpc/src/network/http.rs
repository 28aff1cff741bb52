use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::provider::Transport;
use super::types::{RpcRequest, RpcResponse};
use crate::error::{AstraError, Result};

/// Unary JSON-RPC over HTTP POST.
#[derive(Clone)]
pub struct HttpProvider {
    http_client: Client,
    rpc_url: String,
}

impl HttpProvider {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            rpc_url: rpc_url.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpProvider {
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse> {
        debug!("Sending HTTP RPC request: method={}", request.method);

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} returned HTTP {}: {}", self.rpc_url, status, body);
            return Err(AstraError::Transport(format!(
                "HTTP error from {}: {} - {}",
                self.rpc_url, status, body
            )));
        }

        let body = response.bytes().await?;
        let rpc_response: RpcResponse = serde_json::from_slice(&body)?;

        if rpc_response.id != request.id {
            error!(
                "Response id {} does not match request id {} ({})",
                rpc_response.id, request.id, request.method
            );
            return Err(AstraError::Transport(format!(
                "response id {} does not match request id {}",
                rpc_response.id, request.id
            )));
        }

        if let Some(err) = &rpc_response.error {
            debug!(
                "RPC error for {}: code={}, message={}",
                request.method, err.code, err.message
            );
        }

        Ok(rpc_response)
    }

    fn endpoint(&self) -> &str {
        &self.rpc_url
    }
}
