//! # Escrow Phase
//!
//! The four-phase lifecycle of a position keyed by payment hash. A hash
//! enters `Locked` at most once across the vault's lifetime; `Claimed` and
//! `Refunded` are terminal.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of an escrow position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No position exists under this hash.
    #[default]
    None,
    /// Tokens held, awaiting claim or refund.
    Locked,
    /// Tokens moved to the treasury against a valid preimage.
    Claimed,
    /// Tokens returned to the locking user.
    Refunded,
}

impl Phase {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Self::None, Self::Locked)
                | (Self::Locked, Self::Claimed)
                | (Self::Locked, Self::Refunded)
        )
    }

    /// Check if terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed | Self::Refunded)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::None => "None",
            Phase::Locked => "Locked",
            Phase::Claimed => "Claimed",
            Phase::Refunded => "Refunded",
        };
        write!(f, "{s}")
    }
}
