//! # satbridge Shared Types
//!
//! Value types shared by every satbridge crate:
//!
//! - [`PaymentHash`]: 32-byte SHA-256 payment hashes with canonical hex forms
//!   and the `(low, high)` 128-bit wire split used by the chain RPC
//! - [`ChainAddress`]: normalized on-chain addresses (lowercase `0x` hex)
//! - `amount`: millisatoshi parsing, sat conversions, and sat → token-unit
//!   scaling by the asset's decimals
//!
//! These types sit below every other crate in the workspace and carry no
//! I/O concerns.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod amount;
pub mod errors;
pub mod hash;

pub use address::ChainAddress;
pub use amount::{msat_to_sats, parse_msat, sats_to_token_units, u256_from_words, u256_words};
pub use errors::TypesError;
pub use hash::{sha256_digest, PaymentHash};

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
