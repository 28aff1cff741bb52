use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::messenger::Subscription;
use super::provider::{StreamingTransport, Transport};
use super::types::{RpcError, RpcRequest, RpcResponse, SubscriptionNotification};
use crate::error::{AstraError, Result};

/// Per-request deadline unless overridden with [`WsProvider::with_timeout`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type Reply = oneshot::Sender<Result<RpcResponse>>;

/// In-flight request awaiting its response, keyed by wire id.
enum Pending {
    Call {
        caller_id: u64,
        reply: Reply,
    },
    Subscribe {
        caller_id: u64,
        reply: Reply,
        events: mpsc::UnboundedSender<Value>,
    },
}

impl Pending {
    fn fail(self, err: AstraError) {
        let reply = match self {
            Pending::Call { reply, .. } | Pending::Subscribe { reply, .. } => reply,
        };
        let _ = reply.send(Err(err));
    }
}

type PendingMap = Arc<Mutex<HashMap<u64, Pending>>>;
type SubscriptionMap = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Value>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One live socket: a writer task fed by `outgoing` and a reader task that
/// dispatches responses by id and notifications by subscription id.
struct Connection {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
}

impl Connection {
    async fn open(ws_url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        info!("WebSocket connected to {}", ws_url);

        let (mut write, mut read) = ws_stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions: SubscriptionMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    warn!("WebSocket write failed: {}", e);
                    break;
                }
            }
        });

        let reader_pending = pending.clone();
        let reader_closed = closed.clone();
        let pong = outgoing.clone();
        let url = ws_url.to_string();
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        dispatch(&text, &reader_pending, &subscriptions);
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = pong.send(Message::Pong(data));
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        warn!("WebSocket read from {} failed: {}", url, e);
                        break;
                    }
                    _ => {}
                }
            }

            // Dropping the senders fails every waiter and ends every stream.
            reader_closed.store(true, Ordering::SeqCst);
            lock(&reader_pending).clear();
            lock(&subscriptions).clear();
            info!("WebSocket connection to {} closed", url);
        });

        Ok(Self {
            outgoing,
            pending,
            closed,
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.outgoing.is_closed()
    }
}

/// Route one inbound text frame.
fn dispatch(text: &str, pending: &PendingMap, subscriptions: &SubscriptionMap) {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Dropping unparseable WebSocket frame: {}", e);
            return;
        }
    };

    let is_notification = value
        .get("method")
        .and_then(Value::as_str)
        .is_some_and(|m| m.ends_with("_subscription"));

    if is_notification {
        match serde_json::from_value::<SubscriptionNotification>(value) {
            Ok(notification) => {
                let mut subs = lock(subscriptions);
                let id = notification.params.subscription;
                if let Some(events) = subs.get(&id) {
                    if events.send(notification.params.result).is_err() {
                        debug!("Subscription {} dropped by consumer", id);
                        subs.remove(&id);
                    }
                }
            }
            Err(e) => warn!("Malformed subscription notification: {}", e),
        }
        return;
    }

    if value.get("id").map_or(true, Value::is_null) {
        fail_uncorrelated(value, pending);
        return;
    }

    let mut response = match serde_json::from_value::<RpcResponse>(value) {
        Ok(r) => r,
        Err(e) => {
            warn!("Dropping WebSocket frame that is not a response: {}", e);
            return;
        }
    };

    let entry = lock(pending).remove(&response.id);
    match entry {
        Some(Pending::Call { caller_id, reply }) => {
            response.id = caller_id;
            let _ = reply.send(Ok(response));
        }
        Some(Pending::Subscribe {
            caller_id,
            reply,
            events,
        }) => {
            // Register before replying so no notification can outrun the registration.
            if let Some(sub_id) = response.result.as_ref().and_then(Value::as_str) {
                lock(subscriptions).insert(sub_id.to_string(), events);
            }
            response.id = caller_id;
            let _ = reply.send(Ok(response));
        }
        None => warn!("Response for unknown request id {}", response.id),
    }
}

/// An error frame without an id cannot be matched to its request, so every
/// waiter on the socket gets the error.
fn fail_uncorrelated(value: Value, pending: &PendingMap) {
    let error = value
        .get("error")
        .cloned()
        .and_then(|e| serde_json::from_value::<RpcError>(e).ok());
    let Some(error) = error else {
        warn!("Dropping WebSocket frame without id: {}", value);
        return;
    };

    let waiters: Vec<Pending> = lock(pending).drain().map(|(_, p)| p).collect();
    warn!(
        "Uncorrelated RPC error {} ({}), failing {} pending request(s)",
        error.code,
        error.message,
        waiters.len()
    );
    for waiter in waiters {
        waiter.fail(error.clone().into());
    }
}

/// Duplex JSON-RPC over WebSocket. Connects lazily and reconnects on the
/// next call after the socket drops.
pub struct WsProvider {
    ws_url: String,
    request_timeout: Duration,
    next_id: AtomicU64,
    connection: tokio::sync::Mutex<Option<Arc<Connection>>>,
}

impl WsProvider {
    pub fn new(ws_url: &str) -> Self {
        Self::with_timeout(ws_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(ws_url: &str, request_timeout: Duration) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            request_timeout,
            next_id: AtomicU64::new(1),
            connection: tokio::sync::Mutex::new(None),
        }
    }

    async fn connection(&self) -> Result<Arc<Connection>> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            if !conn.is_closed() {
                return Ok(conn.clone());
            }
        }
        let conn = Arc::new(Connection::open(&self.ws_url).await?);
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Send `request` under a provider-unique wire id so callers sharing this
    /// socket can never receive each other's responses.
    async fn dispatch_request<F>(&self, mut request: RpcRequest, make_pending: F) -> Result<RpcResponse>
    where
        F: FnOnce(u64, Reply) -> Pending + Send,
    {
        let conn = self.connection().await?;
        let caller_id = request.id;
        let wire_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        request.id = wire_id;

        let (reply, response) = oneshot::channel();
        lock(&conn.pending).insert(wire_id, make_pending(caller_id, reply));

        let text = serde_json::to_string(&request)?;
        if conn.outgoing.send(Message::Text(text.into())).is_err() {
            lock(&conn.pending).remove(&wire_id);
            return Err(AstraError::Transport(format!(
                "WebSocket connection to {} is closed",
                self.ws_url
            )));
        }

        match tokio::time::timeout(self.request_timeout, response).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(AstraError::Transport(format!(
                "WebSocket connection to {} closed before response to {}",
                self.ws_url, request.method
            ))),
            Err(_) => {
                lock(&conn.pending).remove(&wire_id);
                Err(AstraError::Transport(format!(
                    "{} on {} timed out after {:?}",
                    request.method, self.ws_url, self.request_timeout
                )))
            }
        }
    }
}

#[async_trait]
impl Transport for WsProvider {
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse> {
        debug!("Sending WS RPC request: method={}", request.method);
        self.dispatch_request(request, |caller_id, reply| Pending::Call { caller_id, reply })
            .await
    }

    fn endpoint(&self) -> &str {
        &self.ws_url
    }
}

#[async_trait]
impl StreamingTransport for WsProvider {
    async fn subscribe(&self, request: RpcRequest) -> Result<Subscription> {
        debug!("Opening WS subscription: method={}, params={:?}", request.method, request.params);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let response = self
            .dispatch_request(request, |caller_id, reply| Pending::Subscribe {
                caller_id,
                reply,
                events: events_tx,
            })
            .await?;

        let result = response.into_result()?;
        let id = result
            .as_str()
            .ok_or_else(|| AstraError::Decode(format!("subscription id is not a string: {}", result)))?;
        info!("Subscription {} opened on {}", id, self.ws_url);
        Ok(Subscription::new(id.to_string(), events_rx))
    }
}
