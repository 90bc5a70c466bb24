//! # satbridge Integration Tests
//!
//! End-to-end scenarios over the assembled bridge: a real escrow vault
//! behind the embedded chain, the gateway's nonce lane, the orchestrator,
//! and the credit monitor, with a scriptable Lightning node.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! └── src/
//!     ├── lib.rs        # This file
//!     ├── harness.rs    # Full-stack fixture builder
//!     └── scenarios.rs  # End-to-end flows
//! ```
//!
//! ## Scenario Coverage
//!
//! - Happy-path claim: lock → pay → preimage → claim, balances conserved
//! - Refund after expiry (anyone) and cooperative operator refund
//! - Lock-once: hash reuse rejected regardless of amount or user
//! - Amount mismatch aborts before any pay or claim traffic
//! - Idempotent repeats: `already_claimed` with zero new traffic
//! - Merchant credit: paid invoice → token transfer, retry on failure
//! - Nonce lane: strictly increasing nonces, re-seed after desync

pub mod harness;

#[cfg(test)]
mod scenarios;
