//! # Payment Orchestrator
//!
//! Drives one payment hash from locked escrow to claimed treasury:
//! dedup gate, lock load, invoice reconciliation, Lightning pay, preimage
//! acquisition, on-chain claim. Every phase lands in the payment record;
//! every failure is serialized into the record exactly once, in the
//! sub-state its domain selects.

use crate::bolt11::decode_bolt11;
use crate::domain::{FailureDomain, OrchestratorError, PaymentRecord, PaymentStatus};
use crate::ports::LightningRpc;
use crate::store::DocumentStore;
use parking_lot::Mutex;
use primitive_types::U256;
use sb_chain_gateway::{ChainGateway, GatewayError};
use sb_escrow::Clock;
use sb_types::PaymentHash;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Lightning pay policy.
#[derive(Clone, Copy, Debug)]
pub struct PaymentPolicy {
    /// How long the node may keep retrying routes.
    pub pay_retry_for_seconds: u64,
    /// Fee ceiling as a percent of the paid amount.
    pub max_fee_percent: f64,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            pay_retry_for_seconds: 30,
            max_fee_percent: 0.5,
        }
    }
}

/// One claim request.
#[derive(Clone, Debug, Default)]
pub struct PayRequest {
    /// Payment hash, any hex spelling.
    pub payment_hash: String,
    /// Caller-supplied invoice, used when the node has none.
    pub bolt11: Option<String>,
    /// Caller-supplied lock transaction hash, recorded verbatim.
    pub tx_hash_hint: Option<String>,
}

/// The terminal shape of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayOutcome {
    /// The claim landed on chain.
    Claimed {
        /// Claim transaction hash.
        tx_hash: String,
    },
    /// The hash was already claimed; nothing was submitted anywhere.
    AlreadyClaimed,
}

/// What invoice reconciliation established.
struct ReconciledInvoice {
    amount_sats: u64,
    already_paid: bool,
    target_bolt11: Option<String>,
    preimage_hex: Option<String>,
    invoice_status: Option<String>,
}

/// The payment-claim coordinator.
pub struct PaymentOrchestrator {
    gateway: Arc<ChainGateway>,
    lightning: Arc<dyn LightningRpc>,
    store: Arc<DocumentStore>,
    clock: Arc<dyn Clock>,
    policy: PaymentPolicy,
    /// Hashes executing right now; check-then-insert is atomic under the
    /// lock, never held across await.
    inflight: Mutex<HashSet<String>>,
    /// Hashes that reached `claimed`; short-circuits repeats before any
    /// chain read.
    processed: Mutex<HashSet<String>>,
}

impl PaymentOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        gateway: Arc<ChainGateway>,
        lightning: Arc<dyn LightningRpc>,
        store: Arc<DocumentStore>,
        clock: Arc<dyn Clock>,
        policy: PaymentPolicy,
    ) -> Self {
        Self {
            gateway,
            lightning,
            store,
            clock,
            policy,
            inflight: Mutex::new(HashSet::new()),
            processed: Mutex::new(HashSet::new()),
        }
    }

    /// Process one claim request end to end. Idempotent per hash: a
    /// repeat after success returns [`PayOutcome::AlreadyClaimed`]
    /// without any Lightning or chain traffic; a concurrent duplicate is
    /// rejected with `payment_inflight`.
    pub async fn process_payment_request(
        &self,
        request: PayRequest,
    ) -> Result<PayOutcome, OrchestratorError> {
        let hash = PaymentHash::parse(&request.payment_hash)
            .map_err(|_| OrchestratorError::InvalidPaymentHash(request.payment_hash.clone()))?;
        let key = hash.to_hex();

        if self.processed.lock().contains(&key) {
            info!("[sb-orchestrator] {} already claimed, skipping", hash);
            let now = self.clock.now();
            self.store
                .mutate(|doc| {
                    if let Some(record) = doc.payments.get_mut(&key) {
                        record.push_event("already_claimed", serde_json::Value::Null, now);
                    }
                })
                .await?;
            return Ok(PayOutcome::AlreadyClaimed);
        }

        {
            let mut inflight = self.inflight.lock();
            if inflight.contains(&key) {
                return Err(OrchestratorError::PaymentInflight);
            }
            inflight.insert(key.clone());
        }

        let result = self.run(hash, &key, &request).await;
        self.inflight.lock().remove(&key);

        if let Err(error) = &result {
            self.record_failure(&key, error).await;
        }
        result
    }

    async fn run(
        &self,
        hash: PaymentHash,
        key: &str,
        request: &PayRequest,
    ) -> Result<PayOutcome, OrchestratorError> {
        // Load the lock first: without a Locked position there is nothing
        // to orchestrate.
        let lock = match self.gateway.load_escrow(hash).await {
            Ok(position) => position,
            Err(GatewayError::NotLockedOnChain { phase }) => {
                return Err(OrchestratorError::LockedNotFound(phase))
            }
            Err(other) => return Err(other.into()),
        };

        let now = self.clock.now();
        let prefixed = hash.to_prefixed_hex();
        let snapshot = json!({
            "user": lock.user.as_str(),
            "amount_sats": lock.amount.to_string(),
            "expires_at": lock.expires_at,
            "locked_at": lock.locked_at,
        });
        self.store
            .mutate(|doc| {
                let record = doc
                    .payments
                    .entry(key.to_string())
                    .or_insert_with(|| PaymentRecord::new(&prefixed, key, now));
                record.user = Some(lock.user.as_str().to_string());
                record.amount_sats = Some(lock.amount.to_string());
                record.expires_at = Some(lock.expires_at);
                record.locked_at = Some(lock.locked_at);
                if record.bolt11.is_none() {
                    record.bolt11 = request.bolt11.clone();
                }
                if record.transaction_hash.is_none() {
                    record.transaction_hash = request.tx_hash_hint.clone();
                }
                record.push_event("payment_requested", snapshot, now);
                record.set_status(PaymentStatus::Received, now);
                record.push_event("processing", serde_json::Value::Null, now);
                record.set_status(PaymentStatus::Processing, now);
            })
            .await?;

        let invoice = self.reconcile_invoice(key, request).await?;

        // The locked amount is sat-denominated; the invoice must match it
        // exactly before anything pays.
        if U256::from(invoice.amount_sats) != lock.amount {
            return Err(OrchestratorError::AmountMismatch {
                invoice_sats: invoice.amount_sats,
                locked: lock.amount.to_string(),
            });
        }

        let mut preimage_hex = invoice.preimage_hex.clone();
        let mut pay_summary = serde_json::Value::Null;

        if !invoice.already_paid {
            let target = invoice
                .target_bolt11
                .clone()
                .ok_or(OrchestratorError::InvoiceNotFound)?;
            let receipt = self
                .lightning
                .pay(
                    &target,
                    self.policy.pay_retry_for_seconds,
                    self.policy.max_fee_percent,
                )
                .await?;

            match receipt.payment_hash.as_deref() {
                Some(receipt_hash) if receipt_hash.to_ascii_lowercase() == key => {}
                _ => return Err(OrchestratorError::LightningPaymentHashMismatch),
            }
            if let Some(paid_msat) = receipt.amount_msat_parsed() {
                if U256::from(paid_msat) != lock.amount * U256::from(1000u64) {
                    return Err(OrchestratorError::LightningPaymentAmountMismatch);
                }
            }

            pay_summary = json!({
                "status": receipt.status,
                "amount_msat": receipt.amount_msat_parsed(),
                "created_at": receipt.created_at,
            });
            if receipt.payment_preimage.is_some() {
                preimage_hex = receipt.payment_preimage.clone();
            }
        }

        if preimage_hex.is_none() {
            let pays = self.lightning.list_pays(key).await?;
            preimage_hex = pays
                .iter()
                .find(|p| p.is_complete())
                .and_then(|p| p.payment_preimage.clone());
        }
        let preimage_hex = preimage_hex.ok_or(OrchestratorError::MissingPreimage)?;
        let preimage =
            hex::decode(preimage_hex.trim()).map_err(|_| OrchestratorError::MissingPreimage)?;

        let now = self.clock.now();
        let amount_sats = invoice.amount_sats;
        let invoice_status = invoice.invoice_status.clone();
        let preimage_for_record = preimage_hex.clone();
        self.store
            .mutate(move |doc| {
                if let Some(record) = doc.payments.get_mut(key) {
                    record.lightning.status = Some("succeeded".to_string());
                    record.lightning.invoice_status = invoice_status;
                    record.lightning.amount_sats = Some(amount_sats);
                    record.lightning.payment_preimage = Some(preimage_for_record);
                    record.push_event("lightning_succeeded", pay_summary, now);
                    record.set_status(PaymentStatus::AwaitingClaim, now);
                    record.chain.status = Some("queued".to_string());
                    record.chain.submitted_at = Some(now);
                    record.push_event("claim_queued", serde_json::Value::Null, now);
                    record.set_status(PaymentStatus::ClaimQueued, now);
                }
            })
            .await?;

        let tx_hash = self.gateway.submit_claim(hash, &preimage).await?;

        let now = self.clock.now();
        let confirmed_tx = tx_hash.clone();
        self.store
            .mutate(move |doc| {
                if let Some(record) = doc.payments.get_mut(key) {
                    record.chain.status = Some("confirmed".to_string());
                    record.chain.tx_hash = Some(confirmed_tx.clone());
                    record.chain.confirmed_at = Some(now);
                    record.push_event("claim_confirmed", json!({ "tx_hash": confirmed_tx }), now);
                    record.set_status(PaymentStatus::Claimed, now);
                }
            })
            .await?;

        self.processed.lock().insert(key.to_string());
        info!("[sb-orchestrator] {} claimed in {}", hash, tx_hash);
        Ok(PayOutcome::Claimed { tx_hash })
    }

    /// Establish the invoice amount (and pay target) for the hash: the
    /// node's invoice wins; a caller-supplied BOLT11 is the fallback and
    /// must carry the same hash.
    async fn reconcile_invoice(
        &self,
        key: &str,
        request: &PayRequest,
    ) -> Result<ReconciledInvoice, OrchestratorError> {
        let invoices = self.lightning.list_invoices_by_payment_hash(key).await?;

        if let Some(node_invoice) = invoices.first() {
            let msat = node_invoice
                .amount_msat_any()
                .ok_or(OrchestratorError::InvoiceMissingAmount)?;
            if msat % 1000 != 0 {
                return Err(OrchestratorError::FractionalSats);
            }
            return Ok(ReconciledInvoice {
                amount_sats: msat / 1000,
                already_paid: node_invoice.is_paid(),
                target_bolt11: node_invoice.bolt11.clone().or_else(|| request.bolt11.clone()),
                preimage_hex: node_invoice.payment_preimage.clone(),
                invoice_status: Some(node_invoice.status.clone()),
            });
        }

        if let Some(bolt11) = &request.bolt11 {
            let decoded = decode_bolt11(bolt11)?;
            if decoded.payment_hash_hex != key {
                return Err(OrchestratorError::HashMismatch);
            }
            return Ok(ReconciledInvoice {
                amount_sats: decoded.amount_sats,
                already_paid: false,
                target_bolt11: Some(bolt11.clone()),
                preimage_hex: None,
                invoice_status: None,
            });
        }

        Err(OrchestratorError::InvoiceNotFound)
    }

    /// Serialize a failure into the record, in the sub-state its domain
    /// selects. The sub-state failure slot is written at most once.
    async fn record_failure(&self, key: &str, error: &OrchestratorError) {
        if matches!(
            error,
            OrchestratorError::InvalidPaymentHash(_) | OrchestratorError::PaymentInflight
        ) {
            // No record to write: the hash never entered orchestration.
            return;
        }

        warn!("[sb-orchestrator] {}: {}", error.code(), error);
        let payload = json!({ "code": error.code(), "message": error.to_string() });
        let domain = error.domain();
        let now = self.clock.now();

        let write = self
            .store
            .mutate(move |doc| {
                let Some(record) = doc.payments.get_mut(key) else {
                    return;
                };
                match domain {
                    FailureDomain::Lightning => {
                        if record.lightning.failure.is_none() {
                            record.lightning.status = Some("failed".to_string());
                            record.lightning.failure = Some(payload.clone());
                            record.push_event("lightning_failed", payload, now);
                            record.set_status(PaymentStatus::LightningFailed, now);
                        }
                    }
                    FailureDomain::Chain => {
                        if record.chain.failure.is_none() {
                            record.chain.status = Some("failed".to_string());
                            record.chain.failure = Some(payload.clone());
                            record.push_event("claim_failed", payload, now);
                            record.set_status(PaymentStatus::ClaimFailed, now);
                        }
                    }
                    FailureDomain::Top => {
                        record.push_event("error", payload, now);
                        record.set_status(PaymentStatus::Error, now);
                    }
                }
            })
            .await;

        if let Err(store_error) = write {
            warn!(
                "[sb-orchestrator] failed to record failure for {}: {}",
                key, store_error
            );
        }
    }
}
