//! # Invoice Records
//!
//! Bridge-issued Lightning invoices awaiting merchant credit, keyed in
//! the store by the local invoice label. The credit sub-state drives the
//! monitor's retry machine; `credited` is absorbing.

use serde::{Deserialize, Serialize};

/// Credit lifecycle of a paid invoice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    /// Not yet attempted (or reset after a stale attempt).
    #[default]
    Pending,
    /// A credit attempt is executing.
    Processing,
    /// Tokens delivered. Absorbing.
    Credited,
    /// Last attempt failed; retried after `next_retry_at`.
    Failed,
}

/// Reconciliation bookkeeping written every monitor pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorSubState {
    /// Last reconciliation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<u64>,
    /// Last reconciliation error, if the node call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Status string the node last reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cln_status: Option<String>,
}

/// Credit attempt state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditSubState {
    /// Lifecycle label.
    #[serde(default)]
    pub status: CreditStatus,
    /// Attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// Sats resolved for the credit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sats: Option<u64>,
    /// Token units delivered, as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_units: Option<String>,
    /// Transfer transaction hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Serialized last error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Earliest time of the next attempt after a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_retry_at: Option<u64>,
    /// When the credit landed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credited_at: Option<u64>,
    /// When the last attempt started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<u64>,
}

/// A bridge-issued invoice and its credit state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Local invoice label (the store key).
    pub label: String,
    /// Requesting user, base64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id_b64: Option<String>,
    /// Merchant's on-chain credit address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_address: Option<String>,
    /// Invoice amount in sats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sats: Option<u64>,
    /// Invoice amount in msat; sats derive from it iff divisible by 1000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_msat: Option<u64>,
    /// The invoice itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bolt11: Option<String>,
    /// Payment hash, lowercase hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
    /// Node-side status (`unpaid`, `paid`, `expired`, ...).
    pub status: String,
    /// When the invoice was paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<u64>,
    /// When the invoice was issued.
    pub created_at: u64,
    /// Reconciliation bookkeeping.
    #[serde(default)]
    pub monitor: MonitorSubState,
    /// Credit attempt state.
    #[serde(default)]
    pub credit: CreditSubState,
}

impl InvoiceRecord {
    /// Create an unpaid record.
    pub fn new(label: &str, now: u64) -> Self {
        Self {
            label: label.to_string(),
            user_id_b64: None,
            credit_address: None,
            amount_sats: None,
            amount_msat: None,
            bolt11: None,
            payment_hash: None,
            status: "unpaid".to_string(),
            paid_at: None,
            created_at: now,
            monitor: MonitorSubState::default(),
            credit: CreditSubState::default(),
        }
    }

    /// Whether the node has marked this invoice paid.
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }

    /// Resolve the credit amount in sats: the sat field, else the msat
    /// field when it divides evenly.
    pub fn resolve_amount_sats(&self) -> Option<u64> {
        if let Some(sats) = self.amount_sats {
            return Some(sats);
        }
        self.amount_msat
            .filter(|msat| msat % 1000 == 0)
            .map(|msat| msat / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_amount_prefers_sats() {
        let mut record = InvoiceRecord::new("inv1", 100);
        record.amount_sats = Some(700);
        record.amount_msat = Some(900_000);
        assert_eq!(record.resolve_amount_sats(), Some(700));
    }

    #[test]
    fn test_resolve_amount_derives_from_msat() {
        let mut record = InvoiceRecord::new("inv1", 100);
        record.amount_msat = Some(700_000);
        assert_eq!(record.resolve_amount_sats(), Some(700));

        record.amount_msat = Some(700_500);
        assert_eq!(record.resolve_amount_sats(), None);
    }

    #[test]
    fn test_credit_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&CreditStatus::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: CreditStatus = serde_json::from_str("\"credited\"").unwrap();
        assert_eq!(parsed, CreditStatus::Credited);
    }

    #[test]
    fn test_default_credit_state_is_pending() {
        let record = InvoiceRecord::new("inv1", 100);
        assert_eq!(record.credit.status, CreditStatus::Pending);
        assert_eq!(record.credit.attempts, 0);
    }
}
