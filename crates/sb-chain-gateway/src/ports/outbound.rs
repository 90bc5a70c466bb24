//! # Outbound Ports
//!
//! The raw chain RPC surface. Entrypoint-level encoding lives in the
//! gateway; this port moves already-encoded calldata.

use crate::domain::{GatewayError, TxStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

/// Chain RPC - outbound port.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Read-only call to a contract entrypoint.
    async fn call(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
    ) -> Result<Value, GatewayError>;

    /// Signed invoke with an explicit account nonce. Returns the
    /// transaction hash.
    async fn invoke(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
        nonce: u64,
    ) -> Result<String, GatewayError>;

    /// Block until the transaction reaches a terminal status.
    async fn wait_for_inclusion(&self, tx_hash: &str) -> Result<TxStatus, GatewayError>;

    /// The operator account's current nonce.
    async fn operator_nonce(&self) -> Result<u64, GatewayError>;
}

/// A recorded invoke, for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedInvoke {
    /// Target contract.
    pub contract: String,
    /// Entrypoint name.
    pub entrypoint: String,
    /// Encoded calldata.
    pub calldata: Vec<String>,
    /// Nonce the submission carried.
    pub nonce: u64,
}

/// Scriptable mock chain for unit tests.
#[derive(Default)]
pub struct MockChainRpc {
    /// Response for the next `call`.
    pub call_response: Mutex<Option<Value>>,
    /// Error message for the next `invoke`; consumed once.
    pub invoke_error: Mutex<Option<String>>,
    /// Status returned by `wait_for_inclusion`.
    pub inclusion_status: Mutex<TxStatus>,
    /// Seed for `operator_nonce`.
    pub chain_nonce: Mutex<u64>,
    /// Every invoke that reached the chain, in arrival order.
    pub invokes: Mutex<Vec<RecordedInvoke>>,
}

impl MockChainRpc {
    /// Create with a given chain-side nonce.
    pub fn with_nonce(nonce: u64) -> Self {
        Self {
            inclusion_status: Mutex::new(TxStatus::AcceptedOnL2),
            chain_nonce: Mutex::new(nonce),
            ..Default::default()
        }
    }

    /// Nonces used so far, in submission order.
    pub fn used_nonces(&self) -> Vec<u64> {
        self.invokes.lock().iter().map(|i| i.nonce).collect()
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn call(
        &self,
        _contract: &str,
        _entrypoint: &str,
        _calldata: Vec<String>,
    ) -> Result<Value, GatewayError> {
        self.call_response
            .lock()
            .clone()
            .ok_or_else(|| GatewayError::Rpc("mock: no call response scripted".into()))
    }

    async fn invoke(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
        nonce: u64,
    ) -> Result<String, GatewayError> {
        if let Some(message) = self.invoke_error.lock().take() {
            return Err(GatewayError::Rpc(message));
        }
        let mut invokes = self.invokes.lock();
        invokes.push(RecordedInvoke {
            contract: contract.to_string(),
            entrypoint: entrypoint.to_string(),
            calldata,
            nonce,
        });
        Ok(format!("0xtx{}", invokes.len()))
    }

    async fn wait_for_inclusion(&self, _tx_hash: &str) -> Result<TxStatus, GatewayError> {
        Ok(self.inclusion_status.lock().clone())
    }

    async fn operator_nonce(&self) -> Result<u64, GatewayError> {
        Ok(*self.chain_nonce.lock())
    }
}
