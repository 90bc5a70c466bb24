//! # Escrow Domain
//!
//! Core types for the escrow vault: the phase state machine, positions,
//! vault configuration, named errors, and emitted events.

mod entities;
mod errors;
mod events;
mod phase;

pub use entities::{EscrowPosition, VaultConfig, MAX_EXPIRY_WINDOW_SECS};
pub use errors::EscrowError;
pub use events::EscrowEvent;
pub use phase::Phase;
