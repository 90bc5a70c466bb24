//! # satbridge Escrow Vault
//!
//! The on-chain half of the bridge: an atomic hashed time-locked escrow
//! over fungible tokens.
//!
//! A payer locks tokens against the SHA-256 hash of a Lightning invoice
//! preimage. The protocol operator, having paid the invoice off-chain and
//! learned the preimage, claims the tokens to the protocol treasury. If no
//! claim lands before the position expires, anyone may trigger a refund to
//! the payer; the operator may also refund cooperatively before expiry.
//!
//! ## State machine
//!
//! ```text
//!             lock_for_ln_payment
//!   None ───────────────────────────► Locked
//!                                    │  │
//!                                    │  │ claim (operator, preimage OK)
//!                                    │  ▼
//!                                    │ Claimed (terminal)
//!                                    │
//!                                    │ now ≥ expires_at: refund (anyone)
//!                                    │ OR operator_refund (operator, any time)
//!                                    ▼
//!                                  Refunded (terminal)
//! ```
//!
//! ## Module structure
//!
//! ```text
//! sb-escrow/
//! ├── domain/          # Phase, EscrowPosition, VaultConfig, errors, events
//! ├── ports/           # TokenLedger, Clock + in-memory implementations
//! └── vault.rs         # EscrowVault state machine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod vault;

// Re-exports
pub use domain::{
    EscrowError, EscrowEvent, EscrowPosition, Phase, VaultConfig, MAX_EXPIRY_WINDOW_SECS,
};
pub use ports::{Clock, InMemoryTokenLedger, ManualClock, SystemClock, TokenLedger};
pub use vault::EscrowVault;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
