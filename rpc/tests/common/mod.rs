#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use astra_rpc::error::{AstraError, Result};
use astra_rpc::network::{
    ProviderHandle, RpcRequest, RpcResponse, StreamingTransport, Subscription, Transport,
};
use astra_rpc::signer::Keyring;

type Responder = Box<dyn Fn(&RpcRequest) -> Result<RpcResponse> + Send + Sync>;

/// Ordered log shared by a transport and a keyring.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// In-memory transport that records every request and answers from a closure.
pub struct MockTransport {
    endpoint: String,
    responder: Responder,
    calls: Mutex<Vec<RpcRequest>>,
    events: Option<EventLog>,
    feeds: Mutex<Vec<mpsc::UnboundedSender<Value>>>,
}

impl MockTransport {
    pub fn new<F>(endpoint: &str, responder: F) -> Arc<Self>
    where
        F: Fn(&RpcRequest) -> Result<RpcResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            endpoint: endpoint.to_string(),
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            events: None,
            feeds: Mutex::new(Vec::new()),
        })
    }

    /// Transport answering every call with `result`.
    pub fn returning(endpoint: &str, result: Value) -> Arc<Self> {
        Self::new(endpoint, move |req| Ok(RpcResponse::success(req.id, result.clone())))
    }

    pub fn logged<F>(endpoint: &str, events: EventLog, responder: F) -> Arc<Self>
    where
        F: Fn(&RpcRequest) -> Result<RpcResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            endpoint: endpoint.to_string(),
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            events: Some(events),
            feeds: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RpcRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.method).collect()
    }

    /// Push a notification to every open subscription.
    pub fn notify(&self, event: Value) {
        for feed in self.feeds.lock().unwrap().iter() {
            let _ = feed.send(event.clone());
        }
    }

    fn record(&self, request: &RpcRequest) {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(events) = &self.events {
            events.lock().unwrap().push(format!("send:{}", request.method));
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse> {
        self.record(&request);
        (self.responder)(&request)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StreamingTransport for MockTransport {
    async fn subscribe(&self, request: RpcRequest) -> Result<Subscription> {
        self.record(&request);
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().unwrap().push(tx);
        Ok(Subscription::new("0xsub".to_string(), rx))
    }
}

pub fn http_handle(transport: &Arc<MockTransport>) -> ProviderHandle {
    ProviderHandle::Http(transport.clone())
}

pub fn ws_handle(transport: &Arc<MockTransport>) -> ProviderHandle {
    ProviderHandle::Ws(transport.clone())
}

/// Keyring holding fixed accounts and recording what it signs.
pub struct RecordingKeyring {
    accounts: Vec<String>,
    signed: Mutex<Vec<Value>>,
    events: Option<EventLog>,
}

impl RecordingKeyring {
    pub fn new(accounts: &[&str], events: Option<EventLog>) -> Arc<Self> {
        Arc::new(Self {
            accounts: accounts.iter().map(|a| a.to_string()).collect(),
            signed: Mutex::new(Vec::new()),
            events,
        })
    }

    pub fn signed(&self) -> Vec<Value> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Keyring for RecordingKeyring {
    fn accounts(&self) -> Vec<String> {
        self.accounts.clone()
    }

    async fn sign(&self, transaction: &Value) -> Result<String> {
        self.signed.lock().unwrap().push(transaction.clone());
        if let Some(events) = &self.events {
            events.lock().unwrap().push("sign".to_string());
        }
        match transaction.get("from").and_then(Value::as_str) {
            Some(_) => Ok("0xf86c808504a817c800".to_string()),
            None => Err(AstraError::Signing("missing from".to_string())),
        }
    }
}
