pub mod http;
pub mod messenger;
pub mod provider;
pub mod shard;
pub mod types;
pub mod ws;

pub use http::HttpProvider;
pub use messenger::{Messenger, MessengerResponse, Subscription};
pub use provider::{Endpoint, ProviderHandle, StreamingTransport, Transport};
pub use shard::{ShardDescriptor, ShardIdInput, ShardTable, ShardingItem};
pub use types::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};
pub use ws::WsProvider;
