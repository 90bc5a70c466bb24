//! # satbridge Credit Monitor
//!
//! The merchant-credit half of the bridge: a periodic loop that
//! reconciles bridge-issued invoices with the Lightning node and, once an
//! invoice is paid, delivers the equivalent token amount to the
//! merchant's on-chain address through the gateway's nonce lane.
//!
//! One invoice at a time, one external call at a time: a tick walks the
//! invoice set sequentially, so the operator nonce lane never contends
//! with itself. Failed credits retry after a configured delay; credit
//! attempts stuck in `processing` past the stale threshold are reset to
//! `pending` with a `stale_processing` annotation and re-attempted on the
//! next tick. A credited invoice is never touched again.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod monitor;

pub use monitor::{CreditMonitor, MonitorConfig, MonitorError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
