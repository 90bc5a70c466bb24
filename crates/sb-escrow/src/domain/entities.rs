//! # Escrow Entities
//!
//! Positions keyed by payment hash, and the vault configuration.

use super::errors::EscrowError;
use super::phase::Phase;
use primitive_types::U256;
use sb_types::ChainAddress;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) on the expiry window: one week in seconds.
pub const MAX_EXPIRY_WINDOW_SECS: u64 = 604_800;

/// A position under a payment hash.
///
/// Once the phase turns terminal the remaining fields are frozen; the
/// entry is never eligible for another transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowPosition {
    /// Lifecycle phase.
    pub phase: Phase,
    /// Address that locked the tokens (non-zero while Locked).
    pub user: ChainAddress,
    /// Locked amount in token units.
    pub amount: U256,
    /// Expiry timestamp, seconds since epoch.
    pub expires_at: u64,
    /// Lock timestamp, seconds since epoch.
    pub locked_at: u64,
}

impl EscrowPosition {
    /// The empty position returned for unknown hashes.
    pub fn none() -> Self {
        Self {
            phase: Phase::None,
            user: ChainAddress::zero(),
            amount: U256::zero(),
            expires_at: 0,
            locked_at: 0,
        }
    }

    /// Whether the position has passed its expiry.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Vault configuration. Mutators are owner-gated on the vault itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Admin allowed to rotate configuration.
    pub owner: ChainAddress,
    /// The single actor allowed to claim and cooperatively refund.
    pub protocol_operator: ChainAddress,
    /// Destination of claimed tokens.
    pub protocol_treasury: ChainAddress,
    /// ERC-20-style token under escrow.
    pub asset: ChainAddress,
    /// Seconds from lock to expiry; must satisfy `0 <= window < 604800`.
    pub expiry_window: u64,
    /// Per-payment cap in token units; must be positive.
    pub payment_limit: U256,
}

impl VaultConfig {
    /// Validate every field against the named error set.
    pub fn validate(&self) -> Result<(), EscrowError> {
        if self.owner.is_zero() {
            return Err(EscrowError::OwnerZero);
        }
        if self.protocol_operator.is_zero() {
            return Err(EscrowError::OperatorZero);
        }
        if self.protocol_treasury.is_zero() {
            return Err(EscrowError::TreasuryZero);
        }
        if self.asset.is_zero() {
            return Err(EscrowError::AssetZero);
        }
        if self.expiry_window >= MAX_EXPIRY_WINDOW_SECS {
            return Err(EscrowError::ExpiryGtWeek(self.expiry_window));
        }
        if self.payment_limit.is_zero() {
            return Err(EscrowError::LimitZero);
        }
        Ok(())
    }
}
