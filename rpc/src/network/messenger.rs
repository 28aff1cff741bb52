use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::provider::{Endpoint, ProviderHandle};
use super::shard::{ShardDescriptor, ShardTable, ShardingItem};
use super::types::{RpcRequest, RpcResponse};
use crate::chain::{ChainId, ChainIdentity, ChainType};
use crate::error::Result;

/// Transport response plus the metadata of the call that produced it.
#[derive(Debug, Clone)]
pub struct MessengerResponse {
    pub response: RpcResponse,
    pub request: RpcRequest,
    pub endpoint: String,
    pub shard_id: u32,
}

impl MessengerResponse {
    /// Drop the transport metadata, keeping the JSON-RPC response only.
    pub fn into_raw(self) -> RpcResponse {
        self.response
    }

    pub fn into_result(self) -> Result<Value> {
        self.response.into_result()
    }
}

/// Live, unbounded stream of decoded subscription events. Ends when the
/// socket closes; it is not restarted.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    events: mpsc::UnboundedReceiver<Value>,
}

impl Subscription {
    pub fn new(id: String, events: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { id, events }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn next_event(&mut self) -> Option<Value> {
        self.events.recv().await
    }
}

impl Stream for Subscription {
    type Item = Value;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.get_mut().events.poll_recv(cx)
    }
}

/// Façade for all RPC traffic: chain identity, shard routing and the bound
/// transport.
///
/// Cloning is cheap; clones share the request id counter so ids stay unique
/// across configuration snapshots.
#[derive(Debug, Clone)]
pub struct Messenger {
    identity: ChainIdentity,
    provider: ProviderHandle,
    shards: ShardTable,
    shard_providers: HashMap<u32, ProviderHandle>,
    default_shard_id: u32,
    next_id: Arc<AtomicU64>,
}

impl Messenger {
    pub fn new(provider: ProviderHandle, chain_type: ChainType, chain_id: ChainId) -> Self {
        Self {
            identity: ChainIdentity::new(chain_type, chain_id),
            provider,
            shards: ShardTable::new(),
            shard_providers: HashMap::new(),
            default_shard_id: 0,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn provider(&self) -> &ProviderHandle {
        &self.provider
    }

    pub fn identity(&self) -> ChainIdentity {
        self.identity
    }

    pub fn chain_type(&self) -> ChainType {
        self.identity.chain_type
    }

    pub fn chain_id(&self) -> ChainId {
        self.identity.chain_id
    }

    pub fn chain_prefix(&self) -> &'static str {
        self.identity.prefix()
    }

    pub fn default_shard_id(&self) -> u32 {
        self.default_shard_id
    }

    pub fn shards(&self) -> &ShardTable {
        &self.shards
    }

    pub fn shard(&self, shard_id: u32) -> Option<&ShardDescriptor> {
        self.shards.get(shard_id)
    }

    /// Shard flagged current, else the default shard id.
    pub fn current_shard_id(&self) -> u32 {
        self.shards
            .current()
            .map(|d| d.shard_id)
            .unwrap_or(self.default_shard_id)
    }

    /// Bind a new default transport. Shard transports are re-resolved so
    /// they follow the new transport kind.
    pub fn set_provider(&mut self, endpoint: impl Into<Endpoint>) -> Result<()> {
        let provider = endpoint.into().resolve()?;
        let shard_providers = resolve_shard_providers(&self.shards, provider.is_ws())?;
        info!("Messenger provider set to {}", provider.endpoint());
        self.provider = provider;
        self.shard_providers = shard_providers;
        Ok(())
    }

    pub fn set_chain_id(&mut self, chain_id: ChainId) {
        info!("Messenger chain id set to {}", chain_id);
        self.identity.chain_id = chain_id;
    }

    pub fn set_chain_type(&mut self, chain_type: ChainType) {
        info!("Messenger chain type set to {}", chain_type);
        self.identity.chain_type = chain_type;
    }

    pub fn set_default_shard_id(&mut self, shard_id: u32) {
        info!("Messenger default shard set to {}", shard_id);
        self.default_shard_id = shard_id;
    }

    /// Upsert sharding descriptors. Malformed input leaves the messenger untouched.
    pub fn set_sharding_structures(&mut self, items: &[ShardingItem]) -> Result<()> {
        let mut shards = self.shards.clone();
        shards.apply(items)?;
        let shard_providers = resolve_shard_providers(&shards, self.provider.is_ws())?;
        info!("Messenger sharding structure updated: {} shard(s)", shards.len());
        self.shards = shards;
        self.shard_providers = shard_providers;
        Ok(())
    }

    /// Shard a call lands on: `shard_id` when given, else [`Messenger::current_shard_id`].
    pub fn route_shard(&self, shard_id: Option<u32>) -> u32 {
        shard_id.unwrap_or_else(|| self.current_shard_id())
    }

    /// Transport bound to the routed shard, else the default transport.
    pub fn transport_for(&self, shard_id: Option<u32>) -> &ProviderHandle {
        let shard_id = self.route_shard(shard_id);
        self.shard_providers.get(&shard_id).unwrap_or(&self.provider)
    }

    /// Apply the chain prefix to `method`.
    ///
    /// No namespace: prefix is prepended. Chain namespace (`astra_`, `eth_`):
    /// replaced. Any other namespace (`net_`, `web3_`): unchanged.
    pub fn rpc_method(&self, method: &str, chain_prefix: Option<&str>) -> String {
        let prefix = chain_prefix.unwrap_or(self.chain_prefix());
        match method.split_once('_') {
            None => format!("{}_{}", prefix, method),
            Some((namespace, rest)) if ChainType::is_chain_namespace(namespace) => {
                format!("{}_{}", prefix, rest)
            }
            Some(_) => method.to_string(),
        }
    }

    fn next_request(&self, method: &str, params: Vec<Value>, chain_prefix: Option<&str>) -> RpcRequest {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        RpcRequest::new(id, &self.rpc_method(method, chain_prefix), params)
    }

    /// Send one shard-routed, chain-prefixed request.
    pub async fn send(
        &self,
        method: &str,
        params: Vec<Value>,
        chain_prefix: Option<&str>,
        shard_id: Option<u32>,
    ) -> Result<MessengerResponse> {
        let shard_id = self.route_shard(shard_id);
        let transport = self.transport_for(Some(shard_id)).clone();
        let request = self.next_request(method, params, chain_prefix);

        debug!(
            "send {} id={} shard={} endpoint={}",
            request.method,
            request.id,
            shard_id,
            transport.endpoint()
        );

        let response = transport.request(request.clone()).await.map_err(|e| {
            error!("{} on shard {} failed: {}", request.method, shard_id, e);
            e
        })?;

        Ok(MessengerResponse {
            response,
            endpoint: transport.endpoint().to_string(),
            request,
            shard_id,
        })
    }

    /// Subscribe to `event_name` (e.g. `newHeads`) over the shard's WS transport.
    pub async fn subscribe(
        &self,
        event_name: &str,
        params: Vec<Value>,
        chain_prefix: Option<&str>,
        shard_id: Option<u32>,
    ) -> Result<Subscription> {
        let transport = self.transport_for(shard_id).clone();
        let mut all_params = Vec::with_capacity(params.len() + 1);
        all_params.push(Value::String(event_name.to_string()));
        all_params.extend(params);

        if !transport.is_ws() {
            // Reject before spending a request id or touching the network.
            return transport
                .subscribe(RpcRequest::new(0, "subscribe", all_params))
                .await;
        }

        let request = self.next_request("subscribe", all_params, chain_prefix);
        transport.subscribe(request).await
    }
}

/// Resolve a transport per shard, matching the default transport kind when
/// the shard offers it.
fn resolve_shard_providers(
    shards: &ShardTable,
    prefer_ws: bool,
) -> Result<HashMap<u32, ProviderHandle>> {
    let mut providers = HashMap::new();
    for shard in shards.iter() {
        let url = if prefer_ws {
            shard.ws_endpoint.as_ref().or(shard.http_endpoint.as_ref())
        } else {
            shard.http_endpoint.as_ref().or(shard.ws_endpoint.as_ref())
        };
        if let Some(url) = url {
            providers.insert(shard.shard_id, ProviderHandle::from_url(url)?);
        }
    }
    Ok(providers)
}
