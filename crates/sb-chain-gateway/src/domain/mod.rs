//! # Gateway Domain
//!
//! Decoded chain views and the gateway's typed error set.

mod errors;
mod types;

pub use errors::GatewayError;
pub use types::{decode_position, parse_phase, LockedPosition, TxStatus};
