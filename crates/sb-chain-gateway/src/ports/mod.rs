//! # Gateway Ports
//!
//! The chain RPC surface the gateway submits through.

mod outbound;

pub use outbound::{ChainRpc, MockChainRpc};
