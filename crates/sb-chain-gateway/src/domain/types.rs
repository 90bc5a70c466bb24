//! # Decoded Chain Views
//!
//! Typed views over the chain's dynamic JSON. The chain library emits the
//! escrow phase in several serializations (tagged variant, numeric,
//! string); [`parse_phase`] accepts them all so the ambiguity never leaks
//! past this module.

use super::errors::GatewayError;
use primitive_types::U256;
use sb_escrow::Phase;
use sb_types::{u256_from_words, ChainAddress, PaymentHash};
use serde_json::Value;

/// Terminal status of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted and settled on L1.
    AcceptedOnL1,
    /// Accepted on L2.
    AcceptedOnL2,
    /// Executed successfully.
    Succeeded,
    /// Any other terminal status, carried verbatim.
    Rejected(String),
}

impl TxStatus {
    /// Whether the transaction landed successfully.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::AcceptedOnL1 | Self::AcceptedOnL2 | Self::Succeeded
        )
    }

    /// Parse a status string as reported by the chain.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "ACCEPTED_ON_L1" => Self::AcceptedOnL1,
            "ACCEPTED_ON_L2" => Self::AcceptedOnL2,
            "SUCCEEDED" => Self::Succeeded,
            _ => Self::Rejected(raw.to_string()),
        }
    }
}

impl Default for TxStatus {
    fn default() -> Self {
        TxStatus::AcceptedOnL2
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AcceptedOnL1 => write!(f, "ACCEPTED_ON_L1"),
            Self::AcceptedOnL2 => write!(f, "ACCEPTED_ON_L2"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Rejected(s) => write!(f, "{s}"),
        }
    }
}

/// Decoded view of a Locked-phase escrow position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockedPosition {
    /// The payment hash keying the position.
    pub hash: PaymentHash,
    /// Locking user, canonical hex.
    pub user: ChainAddress,
    /// Locked amount; the escrow asset is sat-denominated, so this value
    /// is directly comparable to invoice sats.
    pub amount: U256,
    /// Expiry timestamp.
    pub expires_at: u64,
    /// Lock timestamp.
    pub locked_at: u64,
}

/// Parse the escrow phase from any serialization the chain library emits.
pub fn parse_phase(value: &Value) -> Result<Phase, GatewayError> {
    match value {
        Value::String(s) => phase_from_name(s)
            .ok_or_else(|| GatewayError::Decode(format!("unknown phase name: {s}"))),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(Phase::None),
            Some(1) => Ok(Phase::Locked),
            Some(2) => Ok(Phase::Claimed),
            Some(3) => Ok(Phase::Refunded),
            _ => Err(GatewayError::Decode(format!("unknown phase index: {n}"))),
        },
        Value::Object(map) => {
            // Tagged variant: {"Locked": {}} or {"variant": "Locked"}.
            if let Some(Value::String(name)) = map.get("variant") {
                return phase_from_name(name)
                    .ok_or_else(|| GatewayError::Decode(format!("unknown phase name: {name}")));
            }
            if map.len() == 1 {
                let name = map.keys().next().expect("len checked");
                return phase_from_name(name)
                    .ok_or_else(|| GatewayError::Decode(format!("unknown phase name: {name}")));
            }
            Err(GatewayError::Decode(format!("unparseable phase: {value}")))
        }
        _ => Err(GatewayError::Decode(format!("unparseable phase: {value}"))),
    }
}

fn phase_from_name(name: &str) -> Option<Phase> {
    match name.to_ascii_lowercase().as_str() {
        "none" => Some(Phase::None),
        "locked" => Some(Phase::Locked),
        "claimed" => Some(Phase::Claimed),
        "refunded" => Some(Phase::Refunded),
        _ => None,
    }
}

/// Decode a raw `get_escrow` response into a typed position view.
///
/// Expected shape (limbs accepted as JSON numbers or decimal/hex strings):
///
/// ```json
/// {
///   "phase": <any phase serialization>,
///   "user": "0x505",
///   "amount": {"low": "5000", "high": "0"},
///   "expires_at": 4600,
///   "locked_at": 1000
/// }
/// ```
pub fn decode_position(
    hash: PaymentHash,
    raw: &Value,
) -> Result<(Phase, LockedPosition), GatewayError> {
    let phase = parse_phase(
        raw.get("phase")
            .ok_or_else(|| GatewayError::Decode("missing phase".into()))?,
    )?;

    let user_raw = raw
        .get("user")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Decode("missing user".into()))?;
    let user = ChainAddress::parse(user_raw)?;

    let amount_value = raw
        .get("amount")
        .ok_or_else(|| GatewayError::Decode("missing amount".into()))?;
    let low = decode_limb(amount_value.get("low"))?;
    let high = decode_limb(amount_value.get("high"))?;
    let amount = u256_from_words(low, high);

    let expires_at = decode_u64(raw.get("expires_at"))?;
    let locked_at = decode_u64(raw.get("locked_at"))?;

    Ok((
        phase,
        LockedPosition {
            hash,
            user,
            amount,
            expires_at,
            locked_at,
        },
    ))
}

fn decode_limb(value: Option<&Value>) -> Result<u128, GatewayError> {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| GatewayError::Decode(format!("bad limb: {n}"))),
        Some(Value::String(s)) => {
            if let Some(hex_digits) = s.strip_prefix("0x") {
                u128::from_str_radix(hex_digits, 16)
                    .map_err(|_| GatewayError::Decode(format!("bad limb: {s}")))
            } else {
                s.parse::<u128>()
                    .map_err(|_| GatewayError::Decode(format!("bad limb: {s}")))
            }
        }
        other => Err(GatewayError::Decode(format!("bad limb: {other:?}"))),
    }
}

fn decode_u64(value: Option<&Value>) -> Result<u64, GatewayError> {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| GatewayError::Decode(format!("bad timestamp: {n}"))),
        Some(Value::String(s)) => s
            .parse::<u64>()
            .map_err(|_| GatewayError::Decode(format!("bad timestamp: {s}"))),
        other => Err(GatewayError::Decode(format!("bad timestamp: {other:?}"))),
    }
}
