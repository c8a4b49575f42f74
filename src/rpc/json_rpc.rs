//! JSON-RPC ledger client
//!
//! HTTP client for an Ethereum-style node implementing both the fee/nonce
//! oracle and the network client. Read-only queries are retried with
//! exponential backoff; `eth_sendTransaction` is never retried at this level,
//! resubmission is the coordinator's decision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, trace, warn};

use super::rpc_errors::{RpcError, RpcResult};
use crate::config::RpcConfig;
use crate::submission::{FeeNonceOracle, NetworkClient};
use crate::types::{Account, ActionRequest, CallEntryPoint, DeployEntryPoint, PendingTx, Receipt};

/// Read-only retry delays: 50ms, 100ms, 200ms, ... capped at `RETRY_MAX_DELAY`
const RETRY_BASE_MS: u64 = 2;
const RETRY_FACTOR_MS: u64 = 25;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<String>,
    /// Absent on pre-Byzantium receipts
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    contract_address: Option<Address>,
    #[serde(default)]
    gas_used: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self) -> RpcResult<Receipt> {
        const METHOD: &str = "eth_getTransactionReceipt";
        let block_number = match self.block_number {
            Some(ref n) => parse_u64(METHOD, n)?,
            None => 0,
        };
        let status = match self.status {
            Some(ref s) => parse_quantity(METHOD, s)? == 1,
            None => true,
        };
        let gas_used = match self.gas_used {
            Some(ref g) => parse_u64(METHOD, g)?,
            None => 0,
        };
        Ok(Receipt {
            transaction_hash: self.transaction_hash,
            block_number,
            status,
            contract_address: self.contract_address,
            gas_used,
        })
    }
}

/// Node client over HTTP JSON-RPC
#[derive(Debug)]
pub struct JsonRpcClient {
    http: Client,
    url: String,
    timeout_ms: u64,
    max_retries: u32,
    poll_interval: Duration,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
        poll_interval: Duration,
    ) -> RpcResult<Self> {
        let url = url.into();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport {
                endpoint: url.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            url,
            timeout_ms: timeout.as_millis() as u64,
            max_retries,
            poll_interval,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> RpcResult<Self> {
        Self::new(
            config.url.clone(),
            config.timeout(),
            config.max_retries,
            config.poll_interval(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// First account the node manages, used when none is configured
    pub async fn default_account(&self) -> RpcResult<Account> {
        let accounts: Vec<Address> = self.request_with_retry("eth_accounts", json!([])).await?;
        accounts
            .first()
            .copied()
            .map(Account::new)
            .ok_or_else(|| RpcError::decode("eth_accounts", "node manages no accounts"))
    }

    /// Single JSON-RPC round trip
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> RpcResult<T> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(method, id, "JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::from_reqwest(e, &self.url, self.timeout_ms))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RpcError::from_reqwest(e, &self.url, self.timeout_ms))?;

        let parsed: JsonRpcResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(RpcError::Transport {
                    endpoint: self.url.clone(),
                    message: format!("HTTP {}", status),
                });
            }
            Err(e) => return Err(RpcError::decode(method, e.to_string())),
        };

        if let Some(error) = parsed.error {
            debug!(method, id, code = error.code, message = %error.message, "JSON-RPC error response");
            return Err(RpcError::Response {
                code: error.code,
                message: error.message,
            });
        }
        serde_json::from_value(parsed.result).map_err(|e| RpcError::decode(method, e.to_string()))
    }

    /// Read-only request, retried while the error is retryable
    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> RpcResult<T> {
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MS)
            .factor(RETRY_FACTOR_MS)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(self.max_retries as usize);

        RetryIf::start(
            strategy,
            || self.request(method, params.clone()),
            |e: &RpcError| {
                let retry = e.is_retryable();
                if retry {
                    warn!(method, error = %e, "Retrying read-only RPC call");
                }
                retry
            },
        )
        .await
    }

    async fn send_transaction(
        &self,
        from: &Account,
        to: Option<Address>,
        data: Vec<u8>,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx> {
        let tx = transaction_object(from, to, data, request);
        let hash: B256 = self.request("eth_sendTransaction", json!([tx])).await?;
        Ok(PendingTx { hash })
    }

    async fn sequence_number(&self, address: Address, block: &str) -> RpcResult<u64> {
        const METHOD: &str = "eth_getTransactionCount";
        let raw: String = self.request_with_retry(METHOD, json!([address, block])).await?;
        parse_u64(METHOD, &raw)
    }
}

#[async_trait]
impl FeeNonceOracle for JsonRpcClient {
    async fn current_fee_per_unit(&self) -> RpcResult<u128> {
        let raw: String = self.request_with_retry("eth_gasPrice", json!([])).await?;
        parse_quantity("eth_gasPrice", &raw)
    }

    async fn pending_sequence_number(&self, address: Address) -> RpcResult<u64> {
        self.sequence_number(address, "pending").await
    }

    async fn confirmed_sequence_number(&self, address: Address) -> RpcResult<u64> {
        self.sequence_number(address, "latest").await
    }
}

#[async_trait]
impl NetworkClient for JsonRpcClient {
    async fn deploy(
        &self,
        from: &Account,
        target: &DeployEntryPoint,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx> {
        let mut data = target.bytecode.to_vec();
        data.extend_from_slice(&request.encoded_args());
        self.send_transaction(from, None, data, request).await
    }

    async fn invoke(
        &self,
        from: &Account,
        target: &CallEntryPoint,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx> {
        let mut data = target.selector().to_vec();
        data.extend_from_slice(&request.encoded_args());
        self.send_transaction(from, Some(target.contract), data, request)
            .await
    }

    async fn wait_for_receipt(&self, pending: &PendingTx) -> RpcResult<Receipt> {
        loop {
            let receipt: Option<RawReceipt> = self
                .request_with_retry("eth_getTransactionReceipt", json!([pending.hash]))
                .await?;
            match receipt {
                Some(raw) => return raw.into_receipt(),
                None => {
                    trace!(tx_hash = %pending.hash, "Receipt not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

fn transaction_object(
    from: &Account,
    to: Option<Address>,
    data: Vec<u8>,
    request: &ActionRequest,
) -> Value {
    let mut tx = Map::new();
    tx.insert("from".to_string(), json!(from.address));
    if let Some(to) = to {
        tx.insert("to".to_string(), json!(to));
    }
    tx.insert("data".to_string(), json!(Bytes::from(data)));
    if let Some(nonce) = request.overrides.nonce {
        tx.insert("nonce".to_string(), json!(quantity(nonce as u128)));
    }
    if let Some(fee) = request.overrides.fee_per_unit {
        tx.insert("gasPrice".to_string(), json!(quantity(fee)));
    }
    if let Some(gas) = request.overrides.gas_limit {
        tx.insert("gas".to_string(), json!(quantity(gas as u128)));
    }
    Value::Object(tx)
}

/// Hex quantity encoding, `0x0` for zero
fn quantity(value: u128) -> String {
    format!("{:#x}", value)
}

fn parse_quantity(method: &str, raw: &str) -> RpcResult<u128> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::decode(method, format!("quantity '{}' lacks 0x prefix", raw)))?;
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::decode(method, format!("invalid quantity '{}': {}", raw, e)))
}

fn parse_u64(method: &str, raw: &str) -> RpcResult<u64> {
    let value = parse_quantity(method, raw)?;
    u64::try_from(value)
        .map_err(|_| RpcError::decode(method, format!("quantity '{}' exceeds u64", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::{address, U256};

    #[test]
    fn test_quantity_encoding() {
        assert_eq!(quantity(0), "0x0");
        assert_eq!(quantity(255), "0xff");
        assert_eq!(parse_quantity("m", "0x3b9aca00").unwrap(), 1_000_000_000);
        assert!(parse_quantity("m", "12").is_err());
        assert!(parse_quantity("m", "0xzz").is_err());
        assert!(parse_u64("m", "0x1ffffffffffffffff").is_err());
    }

    #[test]
    fn test_transaction_object_fields() {
        let from = Account::new(address!("00000000000000000000000000000000000000f1"));
        let request = ActionRequest::new(vec![DynSolValue::Uint(U256::from(1u64), 256)])
            .with_nonce(5)
            .with_fee_per_unit(100);

        let tx = transaction_object(&from, None, vec![0xab], &request);
        assert_eq!(tx["nonce"], "0x5");
        assert_eq!(tx["gasPrice"], "0x64");
        assert_eq!(tx["data"], "0xab");
        assert!(tx.get("to").is_none());
        assert!(tx.get("gas").is_none());
    }

    #[test]
    fn test_raw_receipt_conversion() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0",
            "contractAddress": null,
            "gasUsed": "0x5208",
        }))
        .unwrap();

        let receipt = raw.into_receipt().unwrap();
        assert_eq!(receipt.block_number, 16);
        assert!(!receipt.status);
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.contract_address, None);
    }
}
