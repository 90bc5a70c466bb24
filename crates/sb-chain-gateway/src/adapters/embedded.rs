//! # Embedded Chain
//!
//! An in-process chain backing the [`crate::ports::ChainRpc`] port with a
//! real [`EscrowVault`]. Executes invokes synchronously at submission,
//! enforces strict account-nonce ordering, and records terminal statuses
//! for inclusion queries. Used by the integration scenarios and local
//! development.

use crate::domain::{GatewayError, TxStatus};
use crate::ports::ChainRpc;
use async_trait::async_trait;
use parking_lot::Mutex;
use sb_escrow::{EscrowVault, InMemoryTokenLedger, Phase, TokenLedger};
use sb_types::{sha256_digest, u256_from_words, u256_words, ChainAddress, PaymentHash};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// In-process chain over an escrow vault and a token ledger.
pub struct EmbeddedChain {
    vault: Arc<EscrowVault>,
    ledger: Arc<InMemoryTokenLedger>,
    /// The operator account every invoke executes as.
    operator: ChainAddress,
    /// Next acceptable account nonce.
    expected_nonce: Mutex<u64>,
    /// Terminal statuses by transaction hash.
    receipts: Mutex<HashMap<String, TxStatus>>,
    /// Nonces of accepted invokes, in submission order.
    accepted_nonces: Mutex<Vec<u64>>,
    /// Scripted transport failure for the next invoke; consumed once.
    next_invoke_error: Mutex<Option<String>>,
}

impl EmbeddedChain {
    /// Create a chain executing as `operator`.
    pub fn new(
        vault: Arc<EscrowVault>,
        ledger: Arc<InMemoryTokenLedger>,
        operator: ChainAddress,
    ) -> Self {
        Self {
            vault,
            ledger,
            operator,
            expected_nonce: Mutex::new(0),
            receipts: Mutex::new(HashMap::new()),
            accepted_nonces: Mutex::new(Vec::new()),
            next_invoke_error: Mutex::new(None),
        }
    }

    /// Transactions accepted so far.
    pub fn transaction_count(&self) -> usize {
        self.receipts.lock().len()
    }

    /// Nonces of accepted invokes, in submission order.
    pub fn accepted_nonces(&self) -> Vec<u64> {
        self.accepted_nonces.lock().clone()
    }

    /// Script a transport failure for the next invoke.
    pub fn inject_invoke_error(&self, message: &str) {
        *self.next_invoke_error.lock() = Some(message.to_string());
    }

    /// Consume a nonce out-of-band, as a competing transaction would.
    pub fn desync_nonce(&self) {
        *self.expected_nonce.lock() += 1;
    }

    /// The vault this chain executes against.
    pub fn vault(&self) -> &Arc<EscrowVault> {
        &self.vault
    }

    fn execute(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: &[String],
    ) -> Result<(), String> {
        let escrow_address = self.vault.address();
        let is_escrow = ChainAddress::parse(contract)
            .map(|a| a == escrow_address)
            .unwrap_or(false);

        if is_escrow {
            match entrypoint {
                "claim" => {
                    let hash = decode_hash(calldata)?;
                    let preimage = decode_byte_array(&calldata[2..])?;
                    self.vault
                        .claim(&self.operator, hash, &preimage)
                        .map_err(|e| e.code().to_string())
                }
                "refund" => {
                    let hash = decode_hash(calldata)?;
                    self.vault.refund(hash).map_err(|e| e.code().to_string())
                }
                "operator_refund" => {
                    let hash = decode_hash(calldata)?;
                    self.vault
                        .operator_refund(&self.operator, hash)
                        .map_err(|e| e.code().to_string())
                }
                other => Err(format!("unknown escrow entrypoint: {other}")),
            }
        } else {
            match entrypoint {
                "transfer" => {
                    if calldata.len() != 3 {
                        return Err("transfer expects 3 calldata felts".to_string());
                    }
                    let token = ChainAddress::parse(contract).map_err(|e| e.to_string())?;
                    let recipient =
                        ChainAddress::parse(&calldata[0]).map_err(|e| e.to_string())?;
                    let low = parse_felt_u128(&calldata[1])?;
                    let high = parse_felt_u128(&calldata[2])?;
                    let amount = u256_from_words(low, high);
                    if self.ledger.transfer(&token, &self.operator, &recipient, amount) {
                        Ok(())
                    } else {
                        Err("TRANSFER_FAIL".to_string())
                    }
                }
                other => Err(format!("unknown token entrypoint: {other}")),
            }
        }
    }
}

#[async_trait]
impl ChainRpc for EmbeddedChain {
    async fn call(
        &self,
        _contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
    ) -> Result<Value, GatewayError> {
        match entrypoint {
            "get_escrow" => {
                let hash = decode_hash(&calldata).map_err(GatewayError::Decode)?;
                let position = self.vault.get_escrow(&hash);
                let (low, high) = u256_words(position.amount);
                Ok(json!({
                    "phase": phase_name(position.phase),
                    "user": position.user.as_str(),
                    "amount": {"low": low.to_string(), "high": high.to_string()},
                    "expires_at": position.expires_at,
                    "locked_at": position.locked_at,
                }))
            }
            "get_config" => {
                let config = self.vault.get_config();
                let (limit_low, limit_high) = u256_words(config.payment_limit);
                Ok(json!({
                    "owner": config.owner.as_str(),
                    "protocol_operator": config.protocol_operator.as_str(),
                    "protocol_treasury": config.protocol_treasury.as_str(),
                    "asset": config.asset.as_str(),
                    "expiry_window": config.expiry_window,
                    "payment_limit": {"low": limit_low.to_string(), "high": limit_high.to_string()},
                }))
            }
            other => Err(GatewayError::Rpc(format!("unknown call entrypoint: {other}"))),
        }
    }

    async fn invoke(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
        nonce: u64,
    ) -> Result<String, GatewayError> {
        if let Some(message) = self.next_invoke_error.lock().take() {
            return Err(GatewayError::Rpc(message));
        }

        {
            let mut expected = self.expected_nonce.lock();
            if nonce != *expected {
                return Err(GatewayError::Rpc(format!(
                    "invalid nonce: expected {expected}, got {nonce}"
                )));
            }
            *expected += 1;
        }

        self.accepted_nonces.lock().push(nonce);
        let tx_hash = transaction_hash(contract, entrypoint, &calldata, nonce);
        let status = match self.execute(contract, entrypoint, &calldata) {
            Ok(()) => TxStatus::AcceptedOnL2,
            Err(code) => TxStatus::Rejected(code),
        };
        debug!("[sb-gateway] embedded tx {} -> {}", tx_hash, status);
        self.receipts.lock().insert(tx_hash.clone(), status);
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: &str) -> Result<TxStatus, GatewayError> {
        self.receipts
            .lock()
            .get(tx_hash)
            .cloned()
            .ok_or_else(|| GatewayError::Rpc(format!("unknown transaction: {tx_hash}")))
    }

    async fn operator_nonce(&self) -> Result<u64, GatewayError> {
        Ok(*self.expected_nonce.lock())
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::None => "None",
        Phase::Locked => "Locked",
        Phase::Claimed => "Claimed",
        Phase::Refunded => "Refunded",
    }
}

fn transaction_hash(contract: &str, entrypoint: &str, calldata: &[String], nonce: u64) -> String {
    let mut material = format!("{contract}|{entrypoint}|{nonce}");
    for felt in calldata {
        material.push('|');
        material.push_str(felt);
    }
    format!("0x{}", hex::encode(sha256_digest(material.as_bytes())))
}

fn decode_hash(calldata: &[String]) -> Result<PaymentHash, String> {
    if calldata.len() < 2 {
        return Err("expected hash limbs".to_string());
    }
    let low = parse_felt_u128(&calldata[0])?;
    let high = parse_felt_u128(&calldata[1])?;
    Ok(PaymentHash::from_words(low, high))
}

fn parse_felt_u128(felt: &str) -> Result<u128, String> {
    let digits = felt
        .strip_prefix("0x")
        .ok_or_else(|| format!("felt without 0x prefix: {felt}"))?;
    u128::from_str_radix(digits, 16).map_err(|_| format!("bad felt: {felt}"))
}

fn parse_felt_bytes(felt: &str, width: usize) -> Result<Vec<u8>, String> {
    let digits = felt
        .strip_prefix("0x")
        .ok_or_else(|| format!("felt without 0x prefix: {felt}"))?;
    let padded = if digits.len() % 2 == 0 {
        digits.to_string()
    } else {
        format!("0{digits}")
    };
    let raw = hex::decode(&padded).map_err(|_| format!("bad felt: {felt}"))?;
    if raw.len() > width {
        return Err(format!("felt wider than {width} bytes: {felt}"));
    }
    // Left-pad: felts collapse leading zero bytes.
    let mut bytes = vec![0u8; width - raw.len()];
    bytes.extend_from_slice(&raw);
    Ok(bytes)
}

/// Decode the flattened byte-array struct back to raw bytes.
fn decode_byte_array(calldata: &[String]) -> Result<Vec<u8>, String> {
    if calldata.is_empty() {
        return Err("empty byte array calldata".to_string());
    }
    let chunk_count = parse_felt_u128(&calldata[0])? as usize;
    if calldata.len() != chunk_count + 3 {
        return Err(format!(
            "byte array length mismatch: {} felts for {} chunks",
            calldata.len(),
            chunk_count
        ));
    }

    let mut bytes = Vec::new();
    for chunk in &calldata[1..=chunk_count] {
        bytes.extend_from_slice(&parse_felt_bytes(chunk, 31)?);
    }
    let pending_len = parse_felt_u128(&calldata[chunk_count + 2])? as usize;
    if pending_len > 30 {
        return Err(format!("pending word too long: {pending_len}"));
    }
    if pending_len > 0 {
        bytes.extend_from_slice(&parse_felt_bytes(&calldata[chunk_count + 1], pending_len)?);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calldata::encode_preimage;
    use sb_escrow::{Clock, ManualClock, TokenLedger, VaultConfig};
    use primitive_types::U256;

    fn addr(s: &str) -> ChainAddress {
        ChainAddress::parse(s).unwrap()
    }

    fn build_chain() -> (EmbeddedChain, Arc<ManualClock>, Arc<InMemoryTokenLedger>) {
        let ledger = Arc::new(InMemoryTokenLedger::new());
        let clock = Arc::new(ManualClock::at(1000));
        let vault = Arc::new(
            EscrowVault::new(
                addr("0x900"),
                VaultConfig {
                    owner: addr("0x101"),
                    protocol_operator: addr("0x202"),
                    protocol_treasury: addr("0x303"),
                    asset: addr("0x404"),
                    expiry_window: 3600,
                    payment_limit: U256::from(10_000u64),
                },
                Arc::clone(&ledger) as Arc<dyn TokenLedger>,
                Arc::clone(&clock) as Arc<dyn Clock>,
            )
            .unwrap(),
        );
        let chain = EmbeddedChain::new(vault, Arc::clone(&ledger), addr("0x202"));
        (chain, clock, ledger)
    }

    fn lock(chain: &EmbeddedChain, ledger: &InMemoryTokenLedger, preimage: &[u8]) -> PaymentHash {
        let user = addr("0x505");
        let hash = PaymentHash::sha256_of(preimage);
        ledger.mint(&addr("0x404"), &user, U256::from(5000u64));
        ledger.approve(&addr("0x404"), &user, &addr("0x900"), U256::from(5000u64));
        chain
            .vault()
            .lock_for_ln_payment(&user, &user, U256::from(5000u64), hash)
            .unwrap();
        hash
    }

    fn claim_calldata(hash: PaymentHash, preimage: &[u8]) -> Vec<String> {
        let (low, high) = hash.to_words();
        let mut calldata = vec![crate::calldata::felt_hex(low), crate::calldata::felt_hex(high)];
        calldata.extend(encode_preimage(preimage).flatten());
        calldata
    }

    #[tokio::test]
    async fn test_get_escrow_round_trip() {
        let (chain, _, ledger) = build_chain();
        let hash = lock(&chain, &ledger, b"embedded");
        let (low, high) = hash.to_words();
        let raw = chain
            .call(
                "0x900",
                "get_escrow",
                vec![crate::calldata::felt_hex(low), crate::calldata::felt_hex(high)],
            )
            .await
            .unwrap();
        let (phase, position) = crate::domain::decode_position(hash, &raw).unwrap();
        assert_eq!(phase, Phase::Locked);
        assert_eq!(position.amount, U256::from(5000u64));
        assert_eq!(position.user, addr("0x505"));
    }

    #[tokio::test]
    async fn test_claim_through_rpc() {
        let (chain, _, ledger) = build_chain();
        let hash = lock(&chain, &ledger, b"claim-rpc");

        let tx = chain
            .invoke("0x900", "claim", claim_calldata(hash, b"claim-rpc"), 0)
            .await
            .unwrap();
        assert_eq!(
            chain.wait_for_inclusion(&tx).await.unwrap(),
            TxStatus::AcceptedOnL2
        );
        assert_eq!(chain.vault().get_escrow(&hash).phase, Phase::Claimed);
        assert_eq!(
            ledger.balance_of(&addr("0x404"), &addr("0x303")),
            U256::from(5000u64)
        );
    }

    #[tokio::test]
    async fn test_bad_preimage_rejected_with_code() {
        let (chain, _, ledger) = build_chain();
        let hash = lock(&chain, &ledger, b"right");

        let tx = chain
            .invoke("0x900", "claim", claim_calldata(hash, b"wrong"), 0)
            .await
            .unwrap();
        assert_eq!(
            chain.wait_for_inclusion(&tx).await.unwrap(),
            TxStatus::Rejected("HASH_MISMATCH".to_string())
        );
    }

    #[tokio::test]
    async fn test_nonce_ordering_enforced() {
        let (chain, _, ledger) = build_chain();
        let hash = lock(&chain, &ledger, b"nonce-order");

        let err = chain
            .invoke("0x900", "claim", claim_calldata(hash, b"nonce-order"), 5)
            .await
            .unwrap_err();
        assert!(err.is_nonce_desync());
        assert_eq!(chain.operator_nonce().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_byte_array_round_trip_long_preimage() {
        // 40 bytes: one full chunk plus a 9-byte pending word.
        let preimage: Vec<u8> = (1..=40u8).collect();
        let flat = encode_preimage(&preimage).flatten();
        assert_eq!(decode_byte_array(&flat).unwrap(), preimage);
    }

    #[tokio::test]
    async fn test_byte_array_round_trip_leading_zeros() {
        let preimage = [0u8, 0, 3, 0, 7];
        let flat = encode_preimage(&preimage).flatten();
        assert_eq!(decode_byte_array(&flat).unwrap(), preimage);
    }

    #[tokio::test]
    async fn test_token_transfer_entrypoint() {
        let (chain, _, ledger) = build_chain();
        ledger.mint(&addr("0x404"), &addr("0x202"), U256::from(700u64));

        let tx = chain
            .invoke(
                "0x404",
                "transfer",
                vec!["0x606".to_string(), "0x2bc".to_string(), "0x0".to_string()],
                0,
            )
            .await
            .unwrap();
        assert!(chain.wait_for_inclusion(&tx).await.unwrap().is_success());
        assert_eq!(
            ledger.balance_of(&addr("0x404"), &addr("0x606")),
            U256::from(700u64)
        );
    }
}
