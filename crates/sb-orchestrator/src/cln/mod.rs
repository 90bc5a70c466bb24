//! # Lightning Node JSON Shapes
//!
//! Typed views over the node's dynamic JSON. Numeric msat fields arrive
//! as integers or strings (`<digits>` or `<digits>msat`); every access
//! goes through [`parse_msat_value`] so the shape ambiguity never leaks
//! past this module.

use sb_types::parse_msat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Lightning node transport errors.
#[derive(Debug, Error, Clone)]
pub enum ClnError {
    /// RPC-level failure from the node.
    #[error("lightning rpc error: {0}")]
    Rpc(String),

    /// Authentication material unavailable or rejected.
    #[error("lightning auth error: {0}")]
    Auth(String),
}

/// One invoice as reported by `listinvoices`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClnInvoice {
    /// Local label.
    #[serde(default)]
    pub label: String,
    /// `unpaid`, `paid`, or `expired`.
    #[serde(default)]
    pub status: String,
    /// Payment hash, hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
    /// Preimage, hex; present once paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
    /// Requested amount; integer or string spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_msat: Option<Value>,
    /// Received amount; integer or string spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_received_msat: Option<Value>,
    /// Legacy paid amount; integer or string spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_msat: Option<Value>,
    /// When the invoice was paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<u64>,
    /// The invoice itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bolt11: Option<String>,
}

impl ClnInvoice {
    /// Whether the node reports this invoice paid.
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }

    /// The invoice amount in msat, trying each spelling the node uses.
    pub fn amount_msat_any(&self) -> Option<u64> {
        [&self.amount_msat, &self.amount_received_msat, &self.paid_msat]
            .into_iter()
            .flatten()
            .find_map(parse_msat_value)
    }
}

/// One pay attempt as reported by `listpays`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClnPay {
    /// Attempt status.
    #[serde(default)]
    pub status: String,
    /// Preimage, hex; present on completed pays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
}

impl ClnPay {
    /// Whether this attempt completed successfully.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.status.as_str(),
            "complete" | "completed" | "paid" | "succeeded"
        )
    }
}

/// The result of a `pay` call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PayResult {
    /// Hash of the paid invoice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
    /// The revealed preimage, hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_preimage: Option<String>,
    /// Invoice amount paid; integer or string spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_msat: Option<Value>,
    /// Total outlay including fees; integer or string spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sent_msat: Option<Value>,
    /// Pay status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// When the pay started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

impl PayResult {
    /// The paid amount in msat, if reported.
    pub fn amount_msat_parsed(&self) -> Option<u64> {
        self.amount_msat.as_ref().and_then(parse_msat_value)
    }
}

/// A freshly issued invoice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedInvoice {
    /// The signed invoice.
    pub bolt11: String,
    /// Expiry timestamp.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expires_at: Option<u64>,
}

/// Parse an msat field in either of the node's spellings.
pub fn parse_msat_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_msat(s).ok(),
        _ => None,
    }
}
