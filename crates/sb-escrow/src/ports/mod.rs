//! # Escrow Ports
//!
//! Outbound dependencies of the vault: the token ledger it moves balances
//! on, and the clock it reads lock/expiry timestamps from.

mod outbound;

pub use outbound::{Clock, InMemoryTokenLedger, ManualClock, SystemClock, TokenLedger};
