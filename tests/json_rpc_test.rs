//! Integration tests for the JSON-RPC client
//!
//! A mockito server stands in for the node; each mock matches on the
//! JSON-RPC method so request order does not matter.

use std::sync::Arc;
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{address, Address, B256, U256};
use ledger_submit::config::{Config, SubmissionConfig};
use ledger_submit::rpc::{JsonRpcClient, RpcError};
use ledger_submit::submission::{Coordinator, FeeNonceOracle, NetworkClient};
use ledger_submit::types::{
    Account, Action, ActionRequest, CallEntryPoint, DeployEntryPoint, PendingTx, SubmissionOutcome,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

const SENDER: Address = address!("00000000000000000000000000000000000000f1");
const TOKEN: Address = address!("00000000000000000000000000000000000000c0");

fn tx_hash() -> String {
    format!("0x{}", "ab".repeat(32))
}

fn client(server: &ServerGuard, max_retries: u32) -> JsonRpcClient {
    JsonRpcClient::new(
        server.url(),
        Duration::from_secs(5),
        max_retries,
        Duration::from_millis(10),
    )
    .unwrap()
}

async fn mock_result(server: &mut ServerGuard, method: &str, result: serde_json::Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
        .create_async()
        .await
}

fn receipt_json(status: &str, contract_address: Option<&str>) -> serde_json::Value {
    json!({
        "transactionHash": tx_hash(),
        "blockNumber": "0x2a",
        "status": status,
        "contractAddress": contract_address,
        "gasUsed": "0x5208",
    })
}

#[tokio::test]
async fn test_fee_quote_parses_hex_quantity() {
    let mut server = Server::new_async().await;
    let mock = mock_result(&mut server, "eth_gasPrice", json!("0x3b9aca00")).await;

    let fee = client(&server, 0).current_fee_per_unit().await.unwrap();

    assert_eq!(fee, 1_000_000_000);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_sequence_numbers_use_block_tags() {
    let mut server = Server::new_async().await;
    let pending = server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "eth_getTransactionCount" })),
            Matcher::Regex(r#""pending""#.to_string()),
        ]))
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "0xc" }).to_string())
        .create_async()
        .await;
    let latest = server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "eth_getTransactionCount" })),
            Matcher::Regex(r#""latest""#.to_string()),
        ]))
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "0xa" }).to_string())
        .create_async()
        .await;

    let client = client(&server, 0);
    assert_eq!(client.pending_sequence_number(SENDER).await.unwrap(), 12);
    assert_eq!(client.confirmed_sequence_number(SENDER).await.unwrap(), 10);

    pending.assert_async().await;
    latest.assert_async().await;
}

#[tokio::test]
async fn test_node_error_is_surfaced_without_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "header not found" }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let err = client(&server, 3).current_fee_per_unit().await.unwrap_err();

    assert_eq!(
        err,
        RpcError::Response {
            code: -32000,
            message: "header not found".to_string()
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retryable_error_is_retried_up_to_limit() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(503)
        .with_body("upstream unavailable")
        .expect(3)
        .create_async()
        .await;

    let err = client(&server, 2).current_fee_per_unit().await.unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }));
    assert!(err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invoke_sends_selector_nonce_and_fee() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "eth_sendTransaction" })),
            Matcher::Regex(r#""data":"0xa9059cbb"#.to_string()),
            Matcher::Regex(r#""nonce":"0x5""#.to_string()),
            Matcher::Regex(r#""gasPrice":"0x64""#.to_string()),
        ]))
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": tx_hash() }).to_string())
        .expect(1)
        .create_async()
        .await;

    let request = ActionRequest::new(vec![
        DynSolValue::Address(SENDER),
        DynSolValue::Uint(U256::from(1_000u64), 256),
    ])
    .with_nonce(5)
    .with_fee_per_unit(100);
    let target = CallEntryPoint::new(TOKEN, "transfer(address,uint256)");

    let pending = client(&server, 0)
        .invoke(&Account::new(SENDER), &target, &request)
        .await
        .unwrap();

    assert_eq!(pending.hash, tx_hash().parse::<B256>().unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_submission_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32603, "message": "nonce too low" }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let target = DeployEntryPoint::new("Vault", vec![0x60u8, 0x80]);
    let err = client(&server, 3)
        .deploy(&Account::new(SENDER), &target, &ActionRequest::default().with_nonce(0))
        .await
        .unwrap_err();

    assert!(err.is_nonce_conflict());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_wait_for_receipt_reads_contract_address() {
    let mut server = Server::new_async().await;
    let contract = "0x00000000000000000000000000000000000000dd";
    let _receipt = mock_result(
        &mut server,
        "eth_getTransactionReceipt",
        receipt_json("0x1", Some(contract)),
    )
    .await;

    let pending = PendingTx {
        hash: tx_hash().parse().unwrap(),
    };
    let receipt = client(&server, 0).wait_for_receipt(&pending).await.unwrap();

    assert!(receipt.status);
    assert_eq!(receipt.block_number, 42);
    assert_eq!(receipt.contract_address, Some(contract.parse().unwrap()));
}

#[tokio::test]
async fn test_default_account_takes_first() {
    let mut server = Server::new_async().await;
    let _accounts = mock_result(
        &mut server,
        "eth_accounts",
        json!([
            "0x00000000000000000000000000000000000000f1",
            "0x00000000000000000000000000000000000000f2"
        ]),
    )
    .await;

    let account = client(&server, 0).default_account().await.unwrap();
    assert_eq!(account.address, SENDER);
}

#[tokio::test]
async fn test_coordinator_submits_through_json_rpc() {
    let mut server = Server::new_async().await;
    let _fee = mock_result(&mut server, "eth_gasPrice", json!("0x64")).await;
    let _nonce = mock_result(&mut server, "eth_getTransactionCount", json!("0x7")).await;
    let send = server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "eth_sendTransaction" })),
            Matcher::Regex(r#""nonce":"0x7""#.to_string()),
        ]))
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": tx_hash() }).to_string())
        .expect(1)
        .create_async()
        .await;
    let _receipt = mock_result(&mut server, "eth_getTransactionReceipt", receipt_json("0x1", None)).await;

    let rpc = Arc::new(client(&server, 0));
    let coordinator = Coordinator::new(
        Account::new(SENDER),
        rpc.clone(),
        rpc,
        SubmissionConfig::default(),
    );
    let action = Action::Invoke(CallEntryPoint::new(TOKEN, "setPrice(uint256)"));
    let outcome = coordinator
        .submit(
            &action,
            ActionRequest::new(vec![DynSolValue::Uint(U256::from(2_310u64), 256)]),
        )
        .await
        .unwrap();

    match outcome {
        SubmissionOutcome::Confirmed(receipt) => {
            assert!(receipt.status);
            assert_eq!(receipt.block_number, 42);
        }
        other => panic!("Expected Confirmed, got {:?}", other),
    }
    send.assert_async().await;
}

#[tokio::test]
async fn test_connect_falls_back_to_node_account() {
    let mut server = Server::new_async().await;
    let accounts = mock_result(
        &mut server,
        "eth_accounts",
        json!(["0x00000000000000000000000000000000000000f1"]),
    )
    .await;

    let mut config = Config::default();
    config.rpc.url = server.url();
    let coordinator = Coordinator::connect(&config).await.unwrap();
    assert_eq!(coordinator.account().address, SENDER);
    accounts.assert_async().await;

    config.account.address = Some("0x00000000000000000000000000000000000000f2".to_string());
    let configured = Coordinator::connect(&config).await.unwrap();
    assert_eq!(
        configured.account().address,
        address!("00000000000000000000000000000000000000f2")
    );
}
