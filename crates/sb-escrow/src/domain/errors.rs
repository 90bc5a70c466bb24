//! # Escrow Errors
//!
//! The named failure set of the vault. Every failure is fatal for the call
//! that raised it; no partial ledger mutation survives a returned error.

use thiserror::Error;

/// Named vault errors. `code()` yields the stable short name surfaced on
/// the wire and asserted by tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Owner address is zero.
    #[error("owner address is zero")]
    OwnerZero,

    /// Operator address is zero.
    #[error("operator address is zero")]
    OperatorZero,

    /// Treasury address is zero.
    #[error("treasury address is zero")]
    TreasuryZero,

    /// Asset address is zero.
    #[error("asset address is zero")]
    AssetZero,

    /// Expiry window is a week or longer.
    #[error("expiry window {0}s is not below one week")]
    ExpiryGtWeek(u64),

    /// Payment limit is zero.
    #[error("payment limit is zero")]
    LimitZero,

    /// Lock amount exceeds the configured payment limit.
    #[error("amount exceeds payment limit")]
    LimitExceeded,

    /// Lock amount is zero.
    #[error("amount is zero")]
    AmountZero,

    /// User address is zero.
    #[error("user address is zero")]
    UserZero,

    /// Caller is not the user being locked for.
    #[error("caller is not the user")]
    NotUser,

    /// Caller is not the protocol operator.
    #[error("caller is not the protocol operator")]
    NotOperator,

    /// Caller is not the owner.
    #[error("caller is not the owner")]
    NotOwner,

    /// A position already exists under this hash.
    #[error("hash already used for a lock")]
    HashReused,

    /// No Locked-phase position under this hash.
    #[error("no locked escrow for hash")]
    NotLocked,

    /// SHA-256 of the preimage does not equal the locked hash.
    #[error("preimage hash mismatch")]
    HashMismatch,

    /// Position has not yet expired.
    #[error("escrow is still active")]
    EscrowActive,

    /// Token transfer_from returned falsey.
    #[error("token transfer_from failed")]
    TransferFromFail,

    /// Token transfer returned falsey.
    #[error("token transfer failed")]
    TransferFail,
}

impl EscrowError {
    /// Stable short name for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OwnerZero => "OWNER_ZERO",
            Self::OperatorZero => "OPERATOR_ZERO",
            Self::TreasuryZero => "TREASURY_ZERO",
            Self::AssetZero => "ASSET_ZERO",
            Self::ExpiryGtWeek(_) => "EXPIRY_GT_WEEK",
            Self::LimitZero => "LIMIT_ZERO",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::AmountZero => "AMOUNT_ZERO",
            Self::UserZero => "USER_ZERO",
            Self::NotUser => "NOT_USER",
            Self::NotOperator => "NOT_OPERATOR",
            Self::NotOwner => "NOT_OWNER",
            Self::HashReused => "HASH_REUSED",
            Self::NotLocked => "NOT_LOCKED",
            Self::HashMismatch => "HASH_MISMATCH",
            Self::EscrowActive => "ESCROW_ACTIVE",
            Self::TransferFromFail => "TRANSFER_FROM_FAIL",
            Self::TransferFail => "TRANSFER_FAIL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(EscrowError::HashReused.code(), "HASH_REUSED");
        assert_eq!(EscrowError::ExpiryGtWeek(604800).code(), "EXPIRY_GT_WEEK");
        assert_eq!(EscrowError::TransferFromFail.code(), "TRANSFER_FROM_FAIL");
    }

    #[test]
    fn test_display_carries_context() {
        let err = EscrowError::ExpiryGtWeek(700000);
        assert!(err.to_string().contains("700000"));
    }
}
