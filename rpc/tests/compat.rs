mod common;

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use astra_rpc::compat::{CompatOptions, CompatProvider};
use astra_rpc::error::AstraError;
use astra_rpc::network::{RpcError, RpcRequest, RpcResponse};
use astra_rpc::signer::{EmptyKeyring, Keyring};
use astra_rpc::{Astra, AstraConfig};

use common::{http_handle, MockTransport, RecordingKeyring};

fn options() -> CompatOptions {
    CompatOptions::new("10000000", "20000000000", "1.0.0").unwrap()
}

fn shim_over(transport: &Arc<MockTransport>, keyring: Arc<dyn Keyring>) -> (Astra, CompatProvider) {
    let astra = Astra::with_provider(http_handle(transport), AstraConfig::default());
    let shim = CompatProvider::new(astra.context().handle(), keyring, options());
    (astra, shim)
}

#[tokio::test]
async fn test_eth_call_is_rewritten_with_same_params() {
    let node = MockTransport::returning("http://node:9500", json!("0x2a"));
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let params = vec![json!({"to": "0x0a", "data": "0x70a08231"}), json!("latest")];
    let response = shim
        .request(RpcRequest::new(77, "eth_call", params.clone()))
        .await
        .unwrap();

    assert_eq!(response.id, 77);
    assert_eq!(response.result, Some(json!("0x2a")));
    let calls = node.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "astra_call");
    assert_eq!(calls[0].params, params);
}

#[tokio::test]
async fn test_receipt_gets_synthetic_status() {
    let node = MockTransport::returning(
        "http://node:9500",
        json!({"transactionHash": "0xabc", "blockNumber": "0x10"}),
    );
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let response = shim
        .request(RpcRequest::new(5, "eth_getTransactionReceipt", vec![json!("0xabc")]))
        .await
        .unwrap();

    assert_eq!(node.methods(), vec!["astra_getTransactionReceipt"]);
    assert_eq!(
        response.result,
        Some(json!({"transactionHash": "0xabc", "blockNumber": "0x10", "status": "0x1"}))
    );
}

#[tokio::test]
async fn test_pending_receipt_stays_null() {
    let node = MockTransport::returning("http://node:9500", Value::Null);
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let response = shim
        .request(RpcRequest::new(5, "eth_getTransactionReceipt", vec![json!("0xabc")]))
        .await
        .unwrap();
    assert_eq!(response.result, Some(Value::Null));
}

#[tokio::test]
async fn test_receipt_error_object_is_terminal() {
    let node = MockTransport::new("http://node:9500", |req| {
        Ok(RpcResponse::failure(
            req.id,
            RpcError {
                code: -32000,
                message: "unknown transaction".to_string(),
                data: None,
            },
        ))
    });
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let err = shim
        .request(RpcRequest::new(5, "eth_getTransactionReceipt", vec![json!("0xabc")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AstraError::Rpc { code: -32000, .. }));
}

#[tokio::test]
async fn test_block_gas_limit_is_clamped() {
    let node = MockTransport::returning(
        "http://node:9500",
        json!({"number": "0x1", "gasLimit": "0x1c9c380"}),
    );
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let response = shim
        .request(RpcRequest::new(
            3,
            "eth_getBlockByNumber",
            vec![json!("latest"), json!(false)],
        ))
        .await
        .unwrap();

    assert_eq!(node.methods(), vec!["astra_getBlockByNumber"]);
    assert_eq!(response.result.unwrap()["gasLimit"], json!("0x989680"));
}

#[tokio::test]
async fn test_send_transaction_signs_once_then_submits_once() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let node = MockTransport::logged("http://node:9500", events.clone(), |req| {
        Ok(RpcResponse::success(req.id, json!("0xhash")))
    });
    let keyring = RecordingKeyring::new(&["0xabc"], Some(events.clone()));
    let (_astra, shim) = shim_over(&node, keyring.clone());

    let response = shim
        .request(RpcRequest::new(
            9,
            "eth_sendTransaction",
            vec![json!({"to": "0xdef", "value": "0x1"})],
        ))
        .await
        .unwrap();

    assert_eq!(response.id, 9);
    assert_eq!(response.result, Some(json!("0xhash")));
    assert_eq!(
        *events.lock().unwrap(),
        vec!["sign".to_string(), "send:astra_sendRawTransaction".to_string()]
    );

    let signed = keyring.signed();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0]["from"], json!("0xabc"));
    assert_eq!(signed[0]["gasLimit"], json!("0x989680"));
    assert_eq!(signed[0]["gasPrice"], json!("0x4a817c800"));
    assert_eq!(node.calls()[0].params, vec![json!("0xf86c808504a817c800")]);
}

#[tokio::test]
async fn test_send_transaction_keeps_caller_gas() {
    let node = MockTransport::returning("http://node:9500", json!("0xhash"));
    let keyring = RecordingKeyring::new(&["0xabc"], None);
    let (_astra, shim) = shim_over(&node, keyring.clone());

    shim.request(RpcRequest::new(
        1,
        "eth_sendTransaction",
        vec![json!({"to": "0xdef", "gas": "0x5208", "gasPrice": "0x1"})],
    ))
    .await
    .unwrap();

    let signed = keyring.signed();
    assert_eq!(signed[0]["gas"], json!("0x5208"));
    assert_eq!(signed[0].get("gasLimit"), None);
    assert_eq!(signed[0]["gasPrice"], json!("0x1"));
}

#[tokio::test]
async fn test_set_provider_redirects_shim() {
    let first = MockTransport::returning("http://first:9500", json!("0x1"));
    let second = MockTransport::returning("http://second:9500", json!("0x2"));
    let (astra, shim) = shim_over(&first, Arc::new(EmptyKeyring));

    astra.set_provider(http_handle(&second)).unwrap();
    let response = shim
        .request(RpcRequest::new(1, "eth_blockNumber", vec![]))
        .await
        .unwrap();

    assert_eq!(response.result, Some(json!("0x2")));
    assert!(first.calls().is_empty());
    assert_eq!(second.methods(), vec!["astra_blockNumber"]);
}

#[tokio::test]
async fn test_client_version_skips_network() {
    let node = MockTransport::returning("http://node:9500", Value::Null);
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let response = shim
        .request(RpcRequest::new(4, "web3_clientVersion", vec![]))
        .await
        .unwrap();
    assert_eq!(response.result, Some(json!("Astra/1.0.0/@astra-js")));

    let response = shim
        .request(RpcRequest::new(5, "net_version", vec![]))
        .await
        .unwrap();
    assert_eq!(response.result, Some(json!("2")));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_transport_error_reaches_callback_and_result() {
    let node = MockTransport::new("http://node:9500", |_| {
        Err(AstraError::Transport("connection refused".to_string()))
    });
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let mut calls = Vec::new();
    let outcome = shim
        .send(RpcRequest::new(1, "eth_blockNumber", vec![]), |err, res| {
            calls.push((err.cloned(), res.cloned()))
        })
        .await;

    let expected = AstraError::Transport("connection refused".to_string());
    assert_eq!(outcome.unwrap_err(), expected);
    assert_eq!(calls, vec![(Some(expected), None)]);
}

#[tokio::test]
async fn test_node_error_delivered_in_response_on_default_path() {
    let node = MockTransport::new("http://node:9500", |req| {
        Ok(RpcResponse::failure(
            req.id,
            RpcError {
                code: -32000,
                message: "execution reverted".to_string(),
                data: Some(json!("0x08c379a0")),
            },
        ))
    });
    let (_astra, shim) = shim_over(&node, Arc::new(EmptyKeyring));

    let mut seen = None;
    let response = shim
        .send_async(RpcRequest::new(8, "eth_call", vec![json!({})]), |err, res| {
            seen = Some((err.is_some(), res.map(|r| r.id)))
        })
        .await
        .unwrap();

    assert_eq!(seen, Some((false, Some(8))));
    assert_eq!(response.error.unwrap().message, "execution reverted");
}
