//! # Escrow Events
//!
//! Events appended to the vault's log on every successful state mutation.
//! Tests and off-chain observers read these to confirm transitions.

use primitive_types::U256;
use sb_types::{ChainAddress, PaymentHash};
use serde::{Deserialize, Serialize};

/// A vault event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    /// Tokens locked under a hash.
    Locked {
        /// Locking user.
        user: ChainAddress,
        /// Locked amount in token units.
        amount: U256,
        /// Payment hash.
        hash: PaymentHash,
        /// Expiry timestamp.
        expires_at: u64,
        /// Lock timestamp.
        locked_at: u64,
    },
    /// Tokens claimed to the treasury.
    Claimed {
        /// User whose lock was claimed.
        user: ChainAddress,
        /// Payment hash.
        hash: PaymentHash,
        /// Claimed amount in token units.
        amount: U256,
        /// The revealed preimage bytes.
        preimage: Vec<u8>,
        /// The caller (always the operator).
        claimer: ChainAddress,
    },
    /// Tokens refunded to the user.
    Refunded {
        /// Payment hash.
        hash: PaymentHash,
        /// Refunded user.
        user: ChainAddress,
        /// Refunded amount in token units.
        amount: U256,
        /// Refund timestamp.
        refunded_at: u64,
    },
    /// Vault ownership moved.
    OwnershipTransferred {
        /// Previous owner.
        previous: ChainAddress,
        /// New owner.
        new: ChainAddress,
    },
    /// A configuration field was rotated by the owner.
    ConfigUpdated {
        /// Which field changed.
        field: &'static str,
    },
}
