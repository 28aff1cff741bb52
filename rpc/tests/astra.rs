mod common;

use std::sync::Arc;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;

use astra_rpc::chain::{ChainId, ChainType};
use astra_rpc::error::AstraError;
use astra_rpc::network::{RpcResponse, ShardingItem};
use astra_rpc::wallet::SignOptions;
use astra_rpc::{Astra, AstraConfig};

use common::{http_handle, ws_handle, MockTransport, RecordingKeyring};

#[tokio::test]
async fn test_reconfiguration_reaches_all_dependents() {
    let first = MockTransport::returning("http://first:9500", json!("0x1"));
    let second = MockTransport::returning("http://second:9500", json!("0x2"));
    let astra = Astra::with_provider(http_handle(&first), AstraConfig::default());

    astra.set_provider(http_handle(&second)).unwrap();
    astra.set_chain_type(ChainType::Eth).unwrap();

    astra.blockchain.get_block_number(None).await.unwrap();
    astra.transactions.send_signed("0xf86c", None).await.unwrap();
    astra.stakings.send_signed("0xf86c", None).await.unwrap();

    assert!(first.calls().is_empty());
    assert_eq!(
        second.methods(),
        vec![
            "eth_blockNumber",
            "eth_sendRawTransaction",
            "eth_sendRawStakingTransaction"
        ]
    );
}

#[tokio::test]
async fn test_malformed_raw_transaction_never_sent() {
    let node = MockTransport::returning("http://node:9500", json!("0xhash"));
    let astra = Astra::with_provider(http_handle(&node), AstraConfig::default());

    let err = astra.transactions.send_signed("not-hex", None).await.unwrap_err();
    assert!(matches!(err, AstraError::MalformedConfig(_)));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_sharding_routes_by_shard() {
    let node = MockTransport::returning("http://node:9500", json!("0x0"));
    let astra = Astra::with_provider(http_handle(&node), AstraConfig::default());

    astra
        .set_sharding_structures(&[
            ShardingItem::new(0).current(true).http("http://s0:9500"),
            ShardingItem::new("1").http("http://s1:9501").ws("ws://s1:9801"),
        ])
        .unwrap();

    let messenger = astra.blockchain.messenger();
    assert_eq!(messenger.shard(1).unwrap().http_endpoint.as_deref(), Some("http://s1:9501"));
    assert_eq!(messenger.transport_for(Some(1)).endpoint(), "http://s1:9501");
    assert_eq!(messenger.current_shard_id(), 0);
}

#[tokio::test]
async fn test_two_current_shards_rejected() {
    let node = MockTransport::returning("http://node:9500", json!("0x0"));
    let astra = Astra::with_provider(http_handle(&node), AstraConfig::default());

    let err = astra
        .set_sharding_structures(&[
            ShardingItem::new(0).current(true).http("http://s0:9500"),
            ShardingItem::new(1).current(true).http("http://s1:9501"),
        ])
        .unwrap_err();

    assert!(matches!(err, AstraError::MalformedConfig(_)));
    assert!(astra.messenger().shards().is_empty());
}

#[tokio::test]
async fn test_subscribe_over_http_is_unsupported() {
    let node = MockTransport::returning("http://node:9500", json!("0x0"));
    let astra = Astra::with_provider(http_handle(&node), AstraConfig::default());

    let err = astra.blockchain.new_block_headers(None).await.unwrap_err();
    assert!(matches!(err, AstraError::UnsupportedOperation(_)));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_subscribe_over_ws_streams_events() {
    let node = MockTransport::returning("ws://node:9800", json!("0xsub"));
    let astra = Astra::with_provider(ws_handle(&node), AstraConfig::default());

    let mut headers = astra.blockchain.new_block_headers(None).await.unwrap();
    assert_eq!(headers.id(), "0xsub");
    assert_eq!(node.calls()[0].method, "astra_subscribe");
    assert_eq!(node.calls()[0].params, vec![json!("newHeads")]);

    node.notify(json!({"number": "0x11"}));
    assert_eq!(headers.next().await, Some(json!({"number": "0x11"})));
}

#[tokio::test]
async fn test_wallet_refreshes_nonce_on_shard() {
    let node = MockTransport::new("http://node:9500", |req| {
        Ok(RpcResponse::success(req.id, json!("0x7")))
    });
    let keyring = RecordingKeyring::new(&["0xabc"], None);
    let config = AstraConfig {
        chain_id: ChainId::ASTRA_PANGAEA,
        shard_id: Some(0),
        ..Default::default()
    };
    let astra = Astra::with_provider(http_handle(&node), config).with_keyring(keyring.clone());

    astra
        .wallet
        .sign_transaction(json!({"to": "0xdef"}), &SignOptions::default())
        .await
        .unwrap();

    let calls = node.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "astra_getTransactionCount");
    assert_eq!(calls[0].params, vec![json!("0xabc"), json!("latest")]);

    let signed = keyring.signed();
    assert_eq!(signed[0]["nonce"], json!(7));
    assert_eq!(signed[0]["chainId"], json!(3));
    assert_eq!(signed[0]["shardID"], json!(0));
}

#[tokio::test]
async fn test_shim_from_facade_shares_configuration() {
    let node = MockTransport::returning("http://node:9500", json!("0x1"));
    let astra = Astra::with_provider(http_handle(&node), AstraConfig::default())
        .with_keyring(Arc::new(astra_rpc::signer::EmptyKeyring));
    let shim = astra.compat_provider(Default::default());

    astra.set_chain_id(ChainId::ASTRA_PANGAEA).unwrap();
    assert_eq!(shim.messenger().chain_id(), ChainId::ASTRA_PANGAEA);
}

#[tokio::test]
async fn test_blockchain_queries_build_node_calls() {
    let node = MockTransport::returning("http://node:9500", json!("0x0"));
    let astra = Astra::with_provider(http_handle(&node), AstraConfig::default());
    let chain = &astra.blockchain;

    chain.get_balance("0xabc", None, None).await.unwrap();
    chain.get_block_by_number("0x10", true, None).await.unwrap();
    chain.get_transaction_receipt("0xfeed", None).await.unwrap();
    chain.get_transaction_count("0xabc", Some("pending"), None).await.unwrap();
    chain.get_code("0xabc", None, None).await.unwrap();
    chain.gas_price(None).await.unwrap();
    chain.net_version(None).await.unwrap();

    let calls: Vec<(String, Vec<serde_json::Value>)> = node
        .calls()
        .into_iter()
        .map(|r| (r.method, r.params))
        .collect();
    assert_eq!(
        calls,
        vec![
            ("astra_getBalance".to_string(), vec![json!("0xabc"), json!("latest")]),
            ("astra_getBlockByNumber".to_string(), vec![json!("0x10"), json!(true)]),
            ("astra_getTransactionReceipt".to_string(), vec![json!("0xfeed")]),
            ("astra_getTransactionCount".to_string(), vec![json!("0xabc"), json!("pending")]),
            ("astra_getCode".to_string(), vec![json!("0xabc"), json!("latest")]),
            ("astra_gasPrice".to_string(), vec![]),
            ("net_version".to_string(), vec![]),
        ]
    );
}
