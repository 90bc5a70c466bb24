//! # Payment Records
//!
//! The persistent audit record of one orchestrated payment, keyed in the
//! store by the lowercase hex hash without prefix. `history` is strictly
//! append-only; `claimed` is absorbing for the overall status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a payment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Record exists, nothing processed yet.
    Created,
    /// A request arrived and the lock snapshot was taken.
    Received,
    /// Orchestration is executing.
    Processing,
    /// Lightning succeeded; claim not yet submitted.
    AwaitingClaim,
    /// Claim submitted, awaiting inclusion.
    ClaimQueued,
    /// Claim confirmed on chain. Absorbing.
    Claimed,
    /// Lightning-side failure.
    LightningFailed,
    /// Chain-side claim failure.
    ClaimFailed,
    /// Any other orchestrator failure.
    Error,
}

/// One append-only history entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Event name.
    pub event: String,
    /// Seconds since epoch.
    pub at: u64,
    /// Free-form event fields.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub fields: Value,
}

/// Lightning-side sub-state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightningSubState {
    /// Progress label (`paying`, `succeeded`, `failed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Invoice status as the node reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_status: Option<String>,
    /// Invoice amount in sats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sats: Option<u64>,
    /// Hex preimage once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
    /// Serialized failure, written at most once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Value>,
}

/// Chain-side sub-state. Persisted under the document key `starknet`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSubState {
    /// Progress label (`queued`, `confirmed`, `failed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Claim transaction hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// When the claim was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<u64>,
    /// When inclusion was confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<u64>,
    /// Serialized failure, written at most once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Value>,
}

/// The full audit record of one payment hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Canonical `0x`-prefixed lowercase hash.
    pub payment_hash: String,
    /// The store key form: lowercase hex, no prefix.
    pub payment_hash_no_prefix: String,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Locking user (escrow snapshot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Locked amount in sats (escrow snapshot), as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sats: Option<String>,
    /// Lock expiry (escrow snapshot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Lock time (escrow snapshot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<u64>,
    /// BOLT11 supplied with the request, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bolt11: Option<String>,
    /// Caller-supplied transaction hash hint, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// Record creation time.
    pub created_at: u64,
    /// Last mutation time.
    pub updated_at: u64,
    /// Lightning sub-state.
    #[serde(default)]
    pub lightning: LightningSubState,
    /// Chain sub-state, persisted under `starknet`.
    #[serde(default, rename = "starknet")]
    pub chain: ChainSubState,
    /// Append-only event log.
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

impl PaymentRecord {
    /// Create a fresh record.
    pub fn new(prefixed: &str, no_prefix: &str, now: u64) -> Self {
        Self {
            payment_hash: prefixed.to_string(),
            payment_hash_no_prefix: no_prefix.to_string(),
            status: PaymentStatus::Created,
            user: None,
            amount_sats: None,
            expires_at: None,
            locked_at: None,
            bolt11: None,
            transaction_hash: None,
            created_at: now,
            updated_at: now,
            lightning: LightningSubState::default(),
            chain: ChainSubState::default(),
            history: Vec::new(),
        }
    }

    /// Append an event and bump `updated_at`. The log never rewrites.
    pub fn push_event(&mut self, event: &str, fields: Value, now: u64) {
        self.history.push(HistoryEvent {
            event: event.to_string(),
            at: now,
            fields,
        });
        self.updated_at = now;
    }

    /// Move the lifecycle label. A `claimed` record never leaves
    /// `claimed`.
    pub fn set_status(&mut self, status: PaymentStatus, now: u64) {
        if self.status == PaymentStatus::Claimed {
            return;
        }
        self.status = status;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_appends_only() {
        let mut record = PaymentRecord::new("0xab", "ab", 100);
        record.push_event("payment_requested", json!({"amount": "5000"}), 100);
        record.push_event("processing", Value::Null, 101);
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[0].event, "payment_requested");
        assert_eq!(record.updated_at, 101);
    }

    #[test]
    fn test_claimed_is_absorbing() {
        let mut record = PaymentRecord::new("0xab", "ab", 100);
        record.set_status(PaymentStatus::Claimed, 200);
        record.set_status(PaymentStatus::Error, 300);
        assert_eq!(record.status, PaymentStatus::Claimed);
        // Timestamp also frozen by the rejected change.
        assert_eq!(record.updated_at, 200);
    }

    #[test]
    fn test_chain_substate_serializes_as_starknet() {
        let mut record = PaymentRecord::new("0xab", "ab", 100);
        record.chain.status = Some("confirmed".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("starknet").is_some());
        assert!(json.get("chain").is_none());

        let back: PaymentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.chain.status.as_deref(), Some("confirmed"));
    }

    #[test]
    fn test_status_snake_case_wire_form() {
        let json = serde_json::to_string(&PaymentStatus::AwaitingClaim).unwrap();
        assert_eq!(json, "\"awaiting_claim\"");
        let json = serde_json::to_string(&PaymentStatus::LightningFailed).unwrap();
        assert_eq!(json, "\"lightning_failed\"");
    }
}
