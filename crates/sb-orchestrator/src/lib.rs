//! # satbridge Payment Orchestrator
//!
//! The off-chain coordinator of a Lightning-paid escrow claim. Given a
//! payment hash, it loads the locked on-chain position, reconciles the
//! amount and hash across three independent representations (the lock,
//! the BOLT11 invoice, and the Lightning pay receipt), pays the invoice,
//! extracts the preimage, and submits the on-chain claim, at most once
//! per hash.
//!
//! ## Safety properties
//!
//! - **At-most-once:** a guarded in-flight set rejects concurrent
//!   duplicates; a processed set short-circuits repeats after success;
//!   the on-chain phase check and the lock-once rule back both up.
//! - **Equality before money moves:** the invoice amount must equal the
//!   locked amount before `pay`, and the pay receipt must echo the same
//!   hash and amount before `claim`.
//! - **Audited:** every phase appends to the payment record's history;
//!   every failure is serialized into the record exactly once.
//!
//! ## Module structure
//!
//! ```text
//! sb-orchestrator/
//! ├── domain/          # PaymentRecord, InvoiceRecord, errors
//! ├── bolt11.rs        # strict BOLT11 decoding
//! ├── cln/             # Lightning node JSON shapes + msat normalization
//! ├── ports/           # LightningRpc + mock node
//! ├── adapters/        # CLN REST client
//! ├── store/           # persistent JSON document store
//! └── service/         # PaymentOrchestrator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod bolt11;
pub mod cln;
pub mod domain;
pub mod ports;
pub mod service;
pub mod store;

// Re-exports
pub use adapters::ClnRestClient;
pub use bolt11::{decode_bolt11, DecodedInvoice};
pub use cln::{ClnError, ClnInvoice, ClnPay, CreatedInvoice, PayResult};
pub use domain::{
    ChainSubState, CreditStatus, HistoryEvent, InvoiceRecord, LightningSubState,
    OrchestratorError, PaymentRecord, PaymentStatus,
};
pub use ports::{LightningRpc, MockLightningNode};
pub use service::{PayOutcome, PayRequest, PaymentOrchestrator, PaymentPolicy};
pub use store::{Document, DocumentStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
