//! # Shared Type Errors
//!
//! Parse and validation failures for the shared value types.

use thiserror::Error;

/// Errors produced while parsing or validating shared value types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Payment hash is not 64 hex characters.
    #[error("invalid payment hash: {0}")]
    InvalidPaymentHash(String),

    /// Address is empty, too long, or not hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address is the zero value.
    #[error("address is zero")]
    ZeroAddress,

    /// Millisatoshi field could not be parsed.
    #[error("unparseable msat value: {0}")]
    UnparseableMsat(String),

    /// Millisatoshi amount is not a whole number of sats.
    #[error("msat amount {0} is not divisible by 1000")]
    FractionalSats(u64),

    /// Token decimals outside the supported range.
    #[error("token decimals {0} outside supported range [8, 77]")]
    DecimalsOutOfRange(u32),

    /// Amount must be positive.
    #[error("amount must be positive")]
    ZeroAmount,
}
