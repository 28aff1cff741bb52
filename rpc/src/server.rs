use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use http::{header, Method};
use jsonrpsee::server::{RpcModule, Server};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::astra::Astra;
use crate::compat::CompatProvider;
use crate::config::Config;
use crate::error::AstraError;
use crate::network::{RpcRequest, RpcResponse};
use crate::signer::EmptyKeyring;

/// JSON-RPC internal error code, used for failures raised locally.
const INTERNAL_ERROR: i32 = -32603;

/// Methods served through the compatibility shim. Anything not answered
/// locally is forwarded under the chain prefix.
pub const SHIM_METHODS: &[&str] = &[
    // accounts and signing
    "eth_accounts",
    "eth_sendTransaction",
    "eth_sendRawTransaction",
    "eth_sign",
    "eth_signTransaction",
    // chain state
    "eth_blockNumber",
    "eth_chainId",
    "eth_coinbase",
    "eth_gasPrice",
    "eth_hashrate",
    "eth_mining",
    "eth_protocolVersion",
    "eth_syncing",
    // blocks
    "eth_getBlockByHash",
    "eth_getBlockByNumber",
    "eth_getBlockTransactionCountByHash",
    "eth_getBlockTransactionCountByNumber",
    "eth_getUncleCountByBlockHash",
    "eth_getUncleCountByBlockNumber",
    // transactions
    "eth_getTransactionByHash",
    "eth_getTransactionByBlockHashAndIndex",
    "eth_getTransactionByBlockNumberAndIndex",
    "eth_getTransactionCount",
    "eth_getTransactionReceipt",
    // accounts state and execution
    "eth_call",
    "eth_estimateGas",
    "eth_getBalance",
    "eth_getCode",
    "eth_getStorageAt",
    // logs and filters
    "eth_getLogs",
    "eth_newFilter",
    "eth_newBlockFilter",
    "eth_newPendingTransactionFilter",
    "eth_getFilterChanges",
    "eth_getFilterLogs",
    "eth_uninstallFilter",
    // net and web3
    "net_listening",
    "net_peerCount",
    "net_version",
    "web3_clientVersion",
    "web3_sha3",
];

/// Shared state for the RPC server.
pub struct RpcState {
    pub shim: CompatProvider,
    next_id: AtomicU64,
}

impl RpcState {
    pub fn new(shim: CompatProvider) -> Self {
        Self {
            shim,
            next_id: AtomicU64::new(1),
        }
    }

    /// Run one call through the shim and flatten it into a jsonrpsee result.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ErrorObjectOwned> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = self
            .shim
            .request(RpcRequest::new(id, method, params))
            .await
            .map_err(rpc_error)?;
        response_result(response)
    }
}

/// Start the JSON-RPC server.
pub async fn start_server(config: Config) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.rpc_port));

    info!("Starting Astra RPC Server on {}", addr);
    info!("Chain: {} (id {})", config.chain_type, config.chain_id);
    info!("Node RPC: {}", config.chain_url);

    let astra = Astra::new(None, config.astra_config())?;
    if !config.sharding.is_empty() {
        astra.set_sharding_structures(&config.sharding)?;
        info!("Sharding structure: {} shard(s)", config.sharding.len());
    }

    let shim = CompatProvider::new(
        astra.context().handle(),
        Arc::new(EmptyKeyring),
        config.compat_options()?,
    );

    // Check the node is reachable
    match astra.blockchain.get_block_number(None).await {
        Ok(height) => info!("Node reachable, latest block {}", height),
        Err(e) => warn!("Could not reach node (will retry on requests): {}", e),
    }

    let state = Arc::new(RpcState::new(shim));

    let mut module = RpcModule::new(state.clone());
    register_methods(&mut module)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let middleware = tower::ServiceBuilder::new().layer(cors);

    let server = Server::builder()
        .set_http_middleware(middleware)
        .build(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind server to {}: {}", addr, e))?;

    info!("Astra RPC Server listening on http://{}", addr);

    let handle = server.start(module);

    // Wait for the server to finish (runs until shutdown signal)
    handle.stopped().await;

    info!("Astra RPC Server stopped");
    Ok(())
}

/// Register every shim method on the module.
pub fn register_methods(module: &mut RpcModule<Arc<RpcState>>) -> Result<()> {
    for &method in SHIM_METHODS {
        module.register_async_method(method, move |params, ctx, _| async move {
            let p = positional_params(&params)?;
            ctx.call(method, p).await
        })?;
    }

    info!("Registered {} RPC methods", SHIM_METHODS.len());
    Ok(())
}

/// Absent params are an empty list; anything but a JSON array is rejected
/// with `-32602`.
fn positional_params(params: &Params<'_>) -> Result<Vec<Value>, ErrorObjectOwned> {
    if params.as_str().is_none() {
        return Ok(Vec::new());
    }
    params.parse()
}

/// A node error object keeps its code, message and data.
fn response_result(response: RpcResponse) -> Result<Value, ErrorObjectOwned> {
    match response.error {
        Some(error) => Err(ErrorObjectOwned::owned(
            error.code as i32,
            error.message,
            error.data,
        )),
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

/// Convert a local failure into a jsonrpsee error.
fn rpc_error(err: AstraError) -> ErrorObjectOwned {
    match err {
        AstraError::Rpc {
            code,
            message,
            data,
        } => ErrorObjectOwned::owned(code as i32, message, data),
        other => ErrorObjectOwned::owned(INTERNAL_ERROR, other.to_string(), None::<()>),
    }
}
