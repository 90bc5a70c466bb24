//! # Orchestration Errors
//!
//! The failure taxonomy of a payment request. `code()` is the stable wire
//! string; `http_status()` the status class surfaced to the caller;
//! `domain()` selects which record sub-state the failure serializes into.

use crate::cln::ClnError;
use sb_chain_gateway::GatewayError;
use thiserror::Error;

/// Which record sub-state a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureDomain {
    /// Lightning-side failure: serialized under `lightning.failure`.
    Lightning,
    /// Chain-side failure: serialized under the chain sub-state.
    Chain,
    /// Anything else: top-level `error`.
    Top,
}

/// Orchestration error types.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The payment hash is not 64 hex characters.
    #[error("invalid payment hash: {0}")]
    InvalidPaymentHash(String),

    /// No Locked-phase position under the hash.
    #[error("no locked escrow found: {0}")]
    LockedNotFound(String),

    /// Another request is executing for the same hash.
    #[error("payment already in flight for hash")]
    PaymentInflight,

    /// Neither the node nor the caller supplied an invoice.
    #[error("no invoice found for payment hash")]
    InvoiceNotFound,

    /// The node's invoice reports no amount.
    #[error("invoice reports no amount")]
    InvoiceMissingAmount,

    /// The invoice amount is not a whole number of sats.
    #[error("invoice amount is not a whole-sat multiple")]
    FractionalSats,

    /// The supplied BOLT11 failed strict decoding.
    #[error("invalid bolt11: {0}")]
    InvalidBolt11(String),

    /// The BOLT11 payment hash does not match the requested hash.
    #[error("bolt11 payment hash does not match request")]
    HashMismatch,

    /// Invoice amount differs from the locked amount.
    #[error("invoice amount {invoice_sats} sats != locked amount {locked} sats")]
    AmountMismatch {
        /// Sats decoded from the invoice.
        invoice_sats: u64,
        /// Locked on-chain amount (sat-denominated).
        locked: String,
    },

    /// The pay receipt echoed a different payment hash.
    #[error("lightning pay receipt hash does not match request")]
    LightningPaymentHashMismatch,

    /// The pay receipt msat amount differs from the locked amount.
    #[error("lightning pay receipt amount does not match locked amount")]
    LightningPaymentAmountMismatch,

    /// No preimage from the pay receipt or completed-pays listing.
    #[error("no preimage available for claim")]
    MissingPreimage,

    /// Lightning node transport failure.
    #[error(transparent)]
    Lightning(#[from] ClnError),

    /// Chain gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Persistent store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl OrchestratorError {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPaymentHash(_) => "invalid_payment_hash",
            Self::LockedNotFound(_) => "locked_not_found",
            Self::PaymentInflight => "payment_inflight",
            Self::InvoiceNotFound => "invoice_not_found",
            Self::InvoiceMissingAmount => "invoice_missing_amount",
            Self::FractionalSats => "fractional_sats",
            Self::InvalidBolt11(_) => "invalid_bolt11",
            Self::HashMismatch => "hash_mismatch",
            Self::AmountMismatch { .. } => "amount_mismatch",
            Self::LightningPaymentHashMismatch => "lightning_payment_hash_mismatch",
            Self::LightningPaymentAmountMismatch => "lightning_payment_amount_mismatch",
            Self::MissingPreimage => "missing_preimage",
            Self::Lightning(_) => "lightning_failed",
            Self::Gateway(GatewayError::ClaimFailed { .. }) => "claim_failed",
            Self::Gateway(GatewayError::TransferFailed { .. }) => "transfer_failed",
            Self::Gateway(GatewayError::NotLockedOnChain { .. }) => "locked_not_found",
            Self::Gateway(_) => "chain_error",
            Self::Store(_) => "store_error",
        }
    }

    /// HTTP status surfaced to the caller.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidPaymentHash(_)
            | Self::InvoiceMissingAmount
            | Self::FractionalSats
            | Self::InvalidBolt11(_)
            | Self::HashMismatch
            | Self::AmountMismatch { .. } => 400,
            Self::LockedNotFound(_) | Self::InvoiceNotFound => 404,
            Self::PaymentInflight => 409,
            Self::Lightning(_) | Self::Gateway(GatewayError::Rpc(_)) => 502,
            _ => 500,
        }
    }

    /// Which record sub-state this failure serializes into.
    pub fn domain(&self) -> FailureDomain {
        match self {
            Self::InvoiceNotFound
            | Self::InvoiceMissingAmount
            | Self::FractionalSats
            | Self::InvalidBolt11(_)
            | Self::HashMismatch
            | Self::AmountMismatch { .. }
            | Self::LightningPaymentHashMismatch
            | Self::LightningPaymentAmountMismatch
            | Self::MissingPreimage
            | Self::Lightning(_) => FailureDomain::Lightning,
            Self::Gateway(GatewayError::ClaimFailed { .. })
            | Self::Gateway(GatewayError::TransferFailed { .. }) => FailureDomain::Chain,
            _ => FailureDomain::Top,
        }
    }
}
