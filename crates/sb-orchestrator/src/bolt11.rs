//! # BOLT11 Decoding
//!
//! Strict decoding of caller-supplied invoices. Only three facts leave
//! this module: the payment hash (lowercase hex), a positive whole-sat
//! amount, and the optional timestamp + expiry. An invoice without a
//! positive whole-sat amount is rejected.

use crate::domain::OrchestratorError;
use lightning_invoice::Bolt11Invoice;

/// The decoded facts of a BOLT11 invoice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInvoice {
    /// Payment hash, 64 lowercase hex chars.
    pub payment_hash_hex: String,
    /// Amount in msat.
    pub amount_msat: u64,
    /// Amount in whole sats.
    pub amount_sats: u64,
    /// Invoice creation time, seconds since epoch.
    pub timestamp: u64,
    /// Expiry window in seconds.
    pub expiry_secs: u64,
}

/// Decode a BOLT11 string strictly.
pub fn decode_bolt11(bolt11: &str) -> Result<DecodedInvoice, OrchestratorError> {
    let invoice: Bolt11Invoice = bolt11
        .trim()
        .parse()
        .map_err(|e| OrchestratorError::InvalidBolt11(format!("{e:?}")))?;

    let hash_bytes: &[u8] = invoice.payment_hash().as_ref();
    let payment_hash_hex = hex::encode(hash_bytes);

    let amount_msat = invoice
        .amount_milli_satoshis()
        .filter(|msat| *msat > 0)
        .ok_or(OrchestratorError::InvoiceMissingAmount)?;
    if amount_msat % 1000 != 0 {
        return Err(OrchestratorError::FractionalSats);
    }

    Ok(DecodedInvoice {
        payment_hash_hex,
        amount_msat,
        amount_sats: amount_msat / 1000,
        timestamp: invoice.duration_since_epoch().as_secs(),
        expiry_secs: invoice.expiry_time().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode_bolt11("not an invoice"),
            Err(OrchestratorError::InvalidBolt11(_))
        ));
        assert!(matches!(
            decode_bolt11(""),
            Err(OrchestratorError::InvalidBolt11(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_checksum() {
        // bech32 shape with a broken checksum.
        assert!(matches!(
            decode_bolt11("lnbc1pvjluezqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"),
            Err(OrchestratorError::InvalidBolt11(_))
        ));
    }

    #[test]
    fn test_whitespace_trimmed_before_parse() {
        // Still invalid, but the failure must be a parse error, not a
        // whitespace artifact.
        assert!(matches!(
            decode_bolt11("  lnbc1notreal  "),
            Err(OrchestratorError::InvalidBolt11(_))
        ));
    }
}
