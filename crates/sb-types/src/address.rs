//! # Chain Addresses
//!
//! On-chain addresses are hex strings of at most 64 hex digits (66 chars
//! with the `0x` prefix). The normalized form is `0x` + lowercase hex with
//! leading zeros stripped, so two spellings of the same address always
//! compare equal.

use crate::errors::TypesError;
use serde::{Deserialize, Serialize};

/// Maximum hex digits in an address (a 256-bit field element).
const MAX_ADDRESS_HEX_DIGITS: usize = 64;

/// A normalized on-chain address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainAddress(String);

impl ChainAddress {
    /// Parse and normalize an address string.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if stripped.is_empty() || stripped.len() > MAX_ADDRESS_HEX_DIGITS {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        if !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }

        let lowered = stripped.to_ascii_lowercase();
        let trimmed_zeros = lowered.trim_start_matches('0');
        if trimmed_zeros.is_empty() {
            // The zero address parses; callers gate on is_zero where it matters.
            return Ok(Self("0x0".to_string()));
        }
        Ok(Self(format!("0x{trimmed_zeros}")))
    }

    /// The zero address.
    pub fn zero() -> Self {
        Self("0x0".to_string())
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == "0x0"
    }

    /// Parse, rejecting the zero address.
    pub fn parse_non_zero(raw: &str) -> Result<Self, TypesError> {
        let addr = Self::parse(raw)?;
        if addr.is_zero() {
            return Err(TypesError::ZeroAddress);
        }
        Ok(addr)
    }

    /// The normalized `0x`-prefixed form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChainAddress({})", self.0)
    }
}

impl std::fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ChainAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ChainAddress> for String {
    fn from(a: ChainAddress) -> Self {
        a.0
    }
}
