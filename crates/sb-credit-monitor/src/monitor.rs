//! # Credit Monitor
//!
//! The reconcile-and-credit loop over the store's invoice set.

use sb_chain_gateway::ChainGateway;
use sb_escrow::Clock;
use sb_orchestrator::{CreditStatus, DocumentStore, InvoiceRecord, LightningRpc};
use sb_types::ChainAddress;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Monitor loop configuration. Intervals are milliseconds.
#[derive(Clone, Copy, Debug)]
pub struct MonitorConfig {
    /// Tick interval.
    pub interval_ms: u64,
    /// Delay before a failed credit retries.
    pub retry_ms: u64,
    /// Age past which a `processing` credit counts as stale.
    pub stale_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 15_000,
            retry_ms: 60_000,
            stale_ms: 300_000,
        }
    }
}

/// Monitor errors. Per-invoice failures are recorded on the invoice and
/// never abort a tick; only store access surfaces here.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The store could not be read or written.
    #[error("store error: {0}")]
    Store(String),
}

/// The reconcile-and-credit loop.
pub struct CreditMonitor {
    lightning: Arc<dyn LightningRpc>,
    gateway: Arc<ChainGateway>,
    store: Arc<DocumentStore>,
    clock: Arc<dyn Clock>,
    config: MonitorConfig,
}

impl CreditMonitor {
    /// Create a monitor.
    pub fn new(
        lightning: Arc<dyn LightningRpc>,
        gateway: Arc<ChainGateway>,
        store: Arc<DocumentStore>,
        clock: Arc<dyn Clock>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            lightning,
            gateway,
            store,
            clock,
            config,
        }
    }

    /// Run until the shutdown channel flips true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "[sb-monitor] starting: interval {}ms, retry {}ms, stale {}ms",
            self.config.interval_ms, self.config.retry_ms, self.config.stale_ms
        );
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = self.tick().await {
                        warn!("[sb-monitor] tick failed: {}", error);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[sb-monitor] shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One pass over every invoice, sequentially.
    pub async fn tick(&self) -> Result<(), MonitorError> {
        let labels: Vec<String> = self
            .read()
            .await?
            .invoices
            .keys()
            .cloned()
            .collect();

        for label in labels {
            self.process_invoice(&label).await?;
        }
        Ok(())
    }

    async fn process_invoice(&self, label: &str) -> Result<(), MonitorError> {
        let Some(mut record) = self.read().await?.invoices.get(label).cloned() else {
            return Ok(());
        };
        let now = self.clock.now();

        // Stuck credit recovery: a processing entry past the stale
        // threshold goes back to pending; this is recovery, not a retry,
        // so no attempt counter moves.
        if record.credit.status == CreditStatus::Processing {
            let stale_secs = self.config.stale_ms / 1000;
            let is_stale = record
                .credit
                .last_attempt_at
                .map(|started| now >= started + stale_secs)
                .unwrap_or(true);
            if is_stale {
                warn!("[sb-monitor] {} credit stale, resetting to pending", label);
                self.mutate_invoice(label, |invoice| {
                    invoice.credit.status = CreditStatus::Pending;
                    invoice.credit.last_error = Some("stale_processing".to_string());
                })
                .await?;
            }
            return Ok(());
        }

        if !record.is_paid() {
            self.reconcile(label, &mut record, now).await?;
        }

        if record.is_paid() && self.creditable(&record, now) {
            self.attempt_credit(label, &record, now).await?;
        }
        Ok(())
    }

    /// Copy the node's view of the invoice into the record.
    async fn reconcile(
        &self,
        label: &str,
        record: &mut InvoiceRecord,
        now: u64,
    ) -> Result<(), MonitorError> {
        match self.lightning.list_invoices_by_label(label).await {
            Ok(found) => {
                let node_invoice = found.into_iter().next();
                let updated = self
                    .mutate_invoice(label, move |invoice| {
                        invoice.monitor.last_checked_at = Some(now);
                        match node_invoice {
                            Some(node) => {
                                invoice.monitor.cln_status = Some(node.status.clone());
                                invoice.monitor.last_error = None;
                                invoice.status = node.status.clone();
                                if let Some(hash) = &node.payment_hash {
                                    invoice.payment_hash = Some(hash.to_ascii_lowercase());
                                }
                                if node.paid_at.is_some() {
                                    invoice.paid_at = node.paid_at;
                                }
                                if let Some(msat) = node.amount_msat_any() {
                                    invoice.amount_msat = Some(msat);
                                    if msat % 1000 == 0 {
                                        invoice.amount_sats = Some(msat / 1000);
                                    }
                                }
                            }
                            None => {
                                invoice.monitor.last_error =
                                    Some("invoice unknown to node".to_string());
                            }
                        }
                        invoice.clone()
                    })
                    .await?;
                if let Some(updated) = updated {
                    *record = updated;
                }
            }
            Err(error) => {
                debug!("[sb-monitor] reconcile {} failed: {}", label, error);
                let message = error.to_string();
                self.mutate_invoice(label, move |invoice| {
                    invoice.monitor.last_checked_at = Some(now);
                    invoice.monitor.last_error = Some(message);
                })
                .await?;
            }
        }
        Ok(())
    }

    /// Whether a paid invoice is due a credit attempt now.
    fn creditable(&self, record: &InvoiceRecord, now: u64) -> bool {
        match record.credit.status {
            CreditStatus::Credited | CreditStatus::Processing => false,
            CreditStatus::Pending => true,
            CreditStatus::Failed => record
                .credit
                .next_retry_at
                .map(|at| now >= at)
                .unwrap_or(true),
        }
    }

    async fn attempt_credit(
        &self,
        label: &str,
        record: &InvoiceRecord,
        now: u64,
    ) -> Result<(), MonitorError> {
        let retry_secs = self.config.retry_ms / 1000;

        let address = record
            .credit_address
            .as_deref()
            .and_then(|raw| ChainAddress::parse_non_zero(raw).ok());
        let Some(address) = address else {
            self.fail_credit(label, "invalid_address", now + retry_secs)
                .await?;
            return Ok(());
        };

        let Some(amount_sats) = record.resolve_amount_sats().filter(|sats| *sats > 0) else {
            self.fail_credit(label, "missing_amount", now + retry_secs)
                .await?;
            return Ok(());
        };

        self.mutate_invoice(label, move |invoice| {
            invoice.credit.status = CreditStatus::Processing;
            invoice.credit.attempts += 1;
            invoice.credit.next_retry_at = None;
            invoice.credit.last_attempt_at = Some(now);
            invoice.credit.amount_sats = Some(amount_sats);
        })
        .await?;

        match self.gateway.submit_transfer(&address, amount_sats).await {
            Ok((tx_hash, amount_units)) => {
                info!(
                    "[sb-monitor] credited {} with {} units in {}",
                    label, amount_units, tx_hash
                );
                let finished = self.clock.now();
                self.mutate_invoice(label, move |invoice| {
                    invoice.credit.status = CreditStatus::Credited;
                    invoice.credit.tx_hash = Some(tx_hash.clone());
                    invoice.credit.amount_units = Some(amount_units.to_string());
                    invoice.credit.credited_at = Some(finished);
                    invoice.credit.last_error = None;
                })
                .await?;
            }
            Err(error) => {
                warn!("[sb-monitor] credit {} failed: {}", label, error);
                let message = error.to_string();
                let finished = self.clock.now();
                self.mutate_invoice(label, move |invoice| {
                    invoice.credit.status = CreditStatus::Failed;
                    invoice.credit.last_error = Some(message);
                    invoice.credit.next_retry_at = Some(finished + retry_secs);
                })
                .await?;
            }
        }
        Ok(())
    }

    async fn fail_credit(
        &self,
        label: &str,
        reason: &'static str,
        retry_at: u64,
    ) -> Result<(), MonitorError> {
        warn!("[sb-monitor] credit {} rejected: {}", label, reason);
        self.mutate_invoice(label, move |invoice| {
            invoice.credit.status = CreditStatus::Failed;
            invoice.credit.last_error = Some(reason.to_string());
            invoice.credit.next_retry_at = Some(retry_at);
        })
        .await?;
        Ok(())
    }

    async fn read(&self) -> Result<sb_orchestrator::Document, MonitorError> {
        self.store
            .read()
            .await
            .map_err(|e| MonitorError::Store(e.to_string()))
    }

    async fn mutate_invoice<T>(
        &self,
        label: &str,
        apply: impl FnOnce(&mut InvoiceRecord) -> T,
    ) -> Result<Option<T>, MonitorError> {
        self.store
            .mutate(|doc| doc.invoices.get_mut(label).map(apply))
            .await
            .map_err(|e| MonitorError::Store(e.to_string()))
    }
}
