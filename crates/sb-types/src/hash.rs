//! # Payment Hashes
//!
//! 32-byte SHA-256 payment hashes. The canonical storage key is the
//! lowercase hex string without a `0x` prefix; the canonical display form
//! is the `0x`-prefixed lowercase string. On the chain wire the hash
//! travels as two 128-bit limbs split little-endian (`low`, `high`) from
//! the big-endian 256-bit value.

use crate::errors::TypesError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 32-byte payment hash in unambiguous big-endian byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentHash(pub [u8; 32]);

impl PaymentHash {
    /// Parse from hex, with or without a `0x` prefix. Accepts mixed case,
    /// requires exactly 64 hex characters.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if stripped.len() != 64 {
            return Err(TypesError::InvalidPaymentHash(s.to_string()));
        }
        let bytes =
            hex::decode(stripped).map_err(|_| TypesError::InvalidPaymentHash(s.to_string()))?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self(hash))
    }

    /// SHA-256 of arbitrary bytes, as a payment hash.
    pub fn sha256_of(preimage: &[u8]) -> Self {
        Self(sha256_digest(preimage))
    }

    /// Canonical store key: lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Canonical display form: `0x`-prefixed lowercase hex.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The hash as an unsigned 256-bit big-endian value.
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Wire split: `(low, high)` 128-bit limbs of the big-endian value.
    pub fn to_words(&self) -> (u128, u128) {
        crate::amount::u256_words(self.to_u256())
    }

    /// Rebuild from `(low, high)` wire limbs.
    pub fn from_words(low: u128, high: u128) -> Self {
        let value = crate::amount::u256_from_words(low, high);
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        Self(bytes)
    }
}

impl std::fmt::Debug for PaymentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentHash({})", self.to_prefixed_hex())
    }
}

impl std::fmt::Display for PaymentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form for logs
        write!(f, "{}…", &self.to_hex()[..8])
    }
}

impl TryFrom<String> for PaymentHash {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PaymentHash> for String {
    fn from(h: PaymentHash) -> Self {
        h.to_prefixed_hex()
    }
}

/// Plain SHA-256 digest.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}
