//! # JSON-RPC Chain Client
//!
//! Speaks JSON-RPC 2.0 to the chain node. Each invoke carries the
//! operator's signing credential and an explicit account nonce; the node
//! signs and broadcasts.

use crate::domain::{GatewayError, TxStatus};
use crate::ports::ChainRpc;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Delay between inclusion polls.
const INCLUSION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// JSON-RPC 2.0 client for the chain node.
pub struct JsonRpcChainClient {
    client: reqwest::Client,
    url: String,
    /// Operator signing credential, forwarded to the node-side signer.
    operator_key: String,
    request_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl JsonRpcChainClient {
    /// Create a client for the node at `url`, submitting with the
    /// operator's signing credential.
    pub fn new(url: &str, operator_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            operator_key: operator_key.to_string(),
            request_id: AtomicU64::new(1),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("[sb-gateway] rpc {} id={}", method, id);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Rpc(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GatewayError::Rpc(format!("http status {status}")));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Rpc(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(GatewayError::Rpc(format!(
                "rpc error {}: {}",
                error.code, error.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| GatewayError::Rpc("rpc response missing result".into()))
    }
}

#[async_trait]
impl ChainRpc for JsonRpcChainClient {
    async fn call(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
    ) -> Result<Value, GatewayError> {
        self.request(
            "bridge_call",
            json!({
                "contract_address": contract,
                "entry_point": entrypoint,
                "calldata": calldata,
            }),
        )
        .await
    }

    async fn invoke(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
        nonce: u64,
    ) -> Result<String, GatewayError> {
        let result = self
            .request(
                "bridge_invoke",
                json!({
                    "operator_key": self.operator_key,
                    "contract_address": contract,
                    "entry_point": entrypoint,
                    "calldata": calldata,
                    "nonce": nonce,
                }),
            )
            .await?;

        result
            .get("transaction_hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Decode("invoke result missing transaction_hash".into()))
    }

    async fn wait_for_inclusion(&self, tx_hash: &str) -> Result<TxStatus, GatewayError> {
        loop {
            let result = self
                .request("bridge_getReceipt", json!({ "transaction_hash": tx_hash }))
                .await?;

            let status = result
                .get("status")
                .and_then(Value::as_str)
                .ok_or_else(|| GatewayError::Decode("receipt missing status".into()))?;

            match status.to_ascii_uppercase().as_str() {
                "PENDING" | "RECEIVED" => {
                    tokio::time::sleep(INCLUSION_POLL_INTERVAL).await;
                }
                terminal => return Ok(TxStatus::parse(terminal)),
            }
        }
    }

    async fn operator_nonce(&self) -> Result<u64, GatewayError> {
        let result = self
            .request(
                "bridge_getNonce",
                json!({ "operator_key": self.operator_key }),
            )
            .await?;

        match &result {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| GatewayError::Decode(format!("bad nonce: {n}"))),
            Value::String(s) => {
                let digits = s.strip_prefix("0x");
                match digits {
                    Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
                    None => s.parse::<u64>(),
                }
                .map_err(|_| GatewayError::Decode(format!("bad nonce: {s}")))
            }
            other => Err(GatewayError::Decode(format!("bad nonce: {other}"))),
        }
    }
}
