//! # Amounts
//!
//! Millisatoshi parsing and conversions. Lightning node JSON reports msat
//! fields as integers or strings shaped `<digits>` or `<digits>msat`
//! (case-insensitive); the parsers here accept every spelling and return a
//! typed integer, so shape ambiguity never leaks past this module.
//!
//! Token-unit scaling: 1 sat = `10^(decimals - 8)` token units, with the
//! asset's decimals restricted to `[8, 77]` so the scale factor fits a
//! 256-bit integer.

use crate::errors::TypesError;
use primitive_types::U256;

/// Lowest token decimals supported (1 unit = 1 sat).
pub const MIN_TOKEN_DECIMALS: u32 = 8;

/// Highest token decimals supported (10^(77-8) still fits in a U256).
pub const MAX_TOKEN_DECIMALS: u32 = 77;

/// Parse a millisatoshi value from its textual spelling: all digits, or
/// digits followed by a case-insensitive `msat` suffix.
pub fn parse_msat(raw: &str) -> Result<u64, TypesError> {
    let trimmed = raw.trim();
    let digits = if trimmed.to_ascii_lowercase().ends_with("msat") {
        &trimmed[..trimmed.len() - 4]
    } else {
        trimmed
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        // Digits-only fallback: salvage a leading run of digits.
        let leading: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        if leading.is_empty() {
            return Err(TypesError::UnparseableMsat(raw.to_string()));
        }
        return leading
            .parse::<u64>()
            .map_err(|_| TypesError::UnparseableMsat(raw.to_string()));
    }

    digits
        .parse::<u64>()
        .map_err(|_| TypesError::UnparseableMsat(raw.to_string()))
}

/// Convert msat to whole sats, rejecting fractional amounts.
pub fn msat_to_sats(msat: u64) -> Result<u64, TypesError> {
    if msat % 1000 != 0 {
        return Err(TypesError::FractionalSats(msat));
    }
    Ok(msat / 1000)
}

/// Scale a sat amount into token units: `sats * 10^(decimals - 8)`.
pub fn sats_to_token_units(amount_sats: u64, decimals: u32) -> Result<U256, TypesError> {
    if !(MIN_TOKEN_DECIMALS..=MAX_TOKEN_DECIMALS).contains(&decimals) {
        return Err(TypesError::DecimalsOutOfRange(decimals));
    }
    if amount_sats == 0 {
        return Err(TypesError::ZeroAmount);
    }
    let scale = U256::from(10u64).pow(U256::from(decimals - MIN_TOKEN_DECIMALS));
    Ok(U256::from(amount_sats) * scale)
}

/// Split a 256-bit value into its `(low, high)` 128-bit wire limbs.
pub fn u256_words(value: U256) -> (u128, u128) {
    let low = value.low_u128();
    let high = (value >> 128).low_u128();
    (low, high)
}

/// Rebuild a 256-bit value from its `(low, high)` wire limbs.
pub fn u256_from_words(low: u128, high: u128) -> U256 {
    (U256::from(high) << 128) | U256::from(low)
}
