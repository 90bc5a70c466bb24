//! # Outbound Ports
//!
//! The Lightning node RPC surface, and a scriptable mock node for tests.

use crate::cln::{ClnError, ClnInvoice, ClnPay, CreatedInvoice, PayResult};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Lightning node RPC - outbound port.
#[async_trait]
pub trait LightningRpc: Send + Sync {
    /// `listinvoices {payment_hash}`.
    async fn list_invoices_by_payment_hash(
        &self,
        payment_hash: &str,
    ) -> Result<Vec<ClnInvoice>, ClnError>;

    /// `listinvoices {label}`.
    async fn list_invoices_by_label(&self, label: &str) -> Result<Vec<ClnInvoice>, ClnError>;

    /// `listpays {payment_hash}`.
    async fn list_pays(&self, payment_hash: &str) -> Result<Vec<ClnPay>, ClnError>;

    /// `pay {bolt11, retry_for, maxfeepercent}`.
    async fn pay(
        &self,
        bolt11: &str,
        retry_for_seconds: u64,
        max_fee_percent: f64,
    ) -> Result<PayResult, ClnError>;

    /// `invoice {amount_msat, label, description, expiry}`.
    async fn create_invoice(
        &self,
        amount_sats: u64,
        label: &str,
        description: &str,
        expiry_seconds: u64,
    ) -> Result<CreatedInvoice, ClnError>;
}

/// A recorded `pay` call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedPay {
    /// The invoice that was paid.
    pub bolt11: String,
    /// The retry window.
    pub retry_for_seconds: u64,
    /// The fee ceiling.
    pub max_fee_percent: f64,
}

/// Scriptable mock Lightning node.
#[derive(Default)]
pub struct MockLightningNode {
    /// Node-known invoices, searched by hash or label.
    pub invoices: Mutex<Vec<ClnInvoice>>,
    /// Completed pays, searched by hash (the mock returns them all).
    pub pays: Mutex<Vec<ClnPay>>,
    /// Result of the next `pay`; falls back to an error when unset.
    pub pay_result: Mutex<Option<PayResult>>,
    /// Error for the next `pay`; consumed once, wins over `pay_result`.
    pub pay_error: Mutex<Option<String>>,
    /// Every pay that reached the node.
    pub recorded_pays: Mutex<Vec<RecordedPay>>,
    /// Error for every list call while set.
    pub list_error: Mutex<Option<String>>,
}

impl MockLightningNode {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an invoice the node knows about.
    pub fn add_invoice(&self, invoice: ClnInvoice) {
        self.invoices.lock().push(invoice);
    }

    /// Number of `pay` calls that reached the node.
    pub fn pay_count(&self) -> usize {
        self.recorded_pays.lock().len()
    }
}

#[async_trait]
impl LightningRpc for MockLightningNode {
    async fn list_invoices_by_payment_hash(
        &self,
        payment_hash: &str,
    ) -> Result<Vec<ClnInvoice>, ClnError> {
        if let Some(message) = self.list_error.lock().clone() {
            return Err(ClnError::Rpc(message));
        }
        Ok(self
            .invoices
            .lock()
            .iter()
            .filter(|i| i.payment_hash.as_deref() == Some(payment_hash))
            .cloned()
            .collect())
    }

    async fn list_invoices_by_label(&self, label: &str) -> Result<Vec<ClnInvoice>, ClnError> {
        if let Some(message) = self.list_error.lock().clone() {
            return Err(ClnError::Rpc(message));
        }
        Ok(self
            .invoices
            .lock()
            .iter()
            .filter(|i| i.label == label)
            .cloned()
            .collect())
    }

    async fn list_pays(&self, _payment_hash: &str) -> Result<Vec<ClnPay>, ClnError> {
        if let Some(message) = self.list_error.lock().clone() {
            return Err(ClnError::Rpc(message));
        }
        Ok(self.pays.lock().clone())
    }

    async fn pay(
        &self,
        bolt11: &str,
        retry_for_seconds: u64,
        max_fee_percent: f64,
    ) -> Result<PayResult, ClnError> {
        self.recorded_pays.lock().push(RecordedPay {
            bolt11: bolt11.to_string(),
            retry_for_seconds,
            max_fee_percent,
        });
        if let Some(message) = self.pay_error.lock().take() {
            return Err(ClnError::Rpc(message));
        }
        self.pay_result
            .lock()
            .clone()
            .ok_or_else(|| ClnError::Rpc("mock: no pay result scripted".into()))
    }

    async fn create_invoice(
        &self,
        amount_sats: u64,
        label: &str,
        _description: &str,
        _expiry_seconds: u64,
    ) -> Result<CreatedInvoice, ClnError> {
        let bolt11 = format!("lnmock{amount_sats}n1{label}");
        self.invoices.lock().push(ClnInvoice {
            label: label.to_string(),
            status: "unpaid".to_string(),
            amount_msat: Some(serde_json::json!(amount_sats * 1000)),
            bolt11: Some(bolt11.clone()),
            ..Default::default()
        });
        Ok(CreatedInvoice {
            bolt11,
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_filters_by_hash_and_label() {
        let node = MockLightningNode::new();
        node.add_invoice(ClnInvoice {
            label: "a".into(),
            payment_hash: Some("aa".into()),
            ..Default::default()
        });
        node.add_invoice(ClnInvoice {
            label: "b".into(),
            payment_hash: Some("bb".into()),
            ..Default::default()
        });

        let by_hash = node.list_invoices_by_payment_hash("aa").await.unwrap();
        assert_eq!(by_hash.len(), 1);
        assert_eq!(by_hash[0].label, "a");

        let by_label = node.list_invoices_by_label("b").await.unwrap();
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].payment_hash.as_deref(), Some("bb"));
    }

    #[tokio::test]
    async fn test_mock_pay_error_consumed_once() {
        let node = MockLightningNode::new();
        *node.pay_error.lock() = Some("route not found".into());
        assert!(node.pay("lnbc1", 30, 0.5).await.is_err());
        assert_eq!(node.pay_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_create_invoice_registers_label() {
        let node = MockLightningNode::new();
        node.create_invoice(700, "inv-x", "d", 3600).await.unwrap();
        let found = node.list_invoices_by_label("inv-x").await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
