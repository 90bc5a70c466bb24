//! # Chain Gateway Service
//!
//! Entrypoint-level encoding plus the serialized operator nonce lane.
//! Every submission assigns its nonce under the lane lock and advances the
//! counter before the transaction leaves, so concurrent submissions hit
//! the chain strictly in arrival order.

use crate::calldata::{encode_preimage, u256_calldata};
use crate::domain::{decode_position, GatewayError, LockedPosition, TxStatus};
use crate::ports::ChainRpc;
use primitive_types::U256;
use sb_escrow::Phase;
use sb_types::{sats_to_token_units, ChainAddress, PaymentHash};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Escrow contract address.
    pub escrow_address: ChainAddress,
    /// Token contract address.
    pub token_address: ChainAddress,
    /// Token decimals, in [8, 77].
    pub token_decimals: u32,
}

/// Typed gateway over the chain RPC with a serialized nonce lane.
pub struct ChainGateway {
    rpc: Arc<dyn ChainRpc>,
    config: GatewayConfig,
    /// The lane: `None` means unseeded; re-seeded after a desync error.
    nonce: tokio::sync::Mutex<Option<u64>>,
}

impl ChainGateway {
    /// Create a gateway, validating the token decimals.
    pub fn new(rpc: Arc<dyn ChainRpc>, config: GatewayConfig) -> Result<Self, GatewayError> {
        if !(8..=77).contains(&config.token_decimals) {
            return Err(GatewayError::InvalidDecimals(config.token_decimals));
        }
        Ok(Self {
            rpc,
            config,
            nonce: tokio::sync::Mutex::new(None),
        })
    }

    /// Read the position under `hash`; fails unless it is Locked.
    pub async fn load_escrow(&self, hash: PaymentHash) -> Result<LockedPosition, GatewayError> {
        let (low, high) = hash.to_words();
        let raw = self
            .rpc
            .call(
                self.config.escrow_address.as_str(),
                "get_escrow",
                vec![crate::calldata::felt_hex(low), crate::calldata::felt_hex(high)],
            )
            .await?;

        let (phase, position) = decode_position(hash, &raw)?;
        if phase != Phase::Locked {
            return Err(GatewayError::NotLockedOnChain {
                phase: phase.to_string(),
            });
        }
        debug!(
            "[sb-gateway] loaded lock {}: {} units, expires {}",
            hash, position.amount, position.expires_at
        );
        Ok(position)
    }

    /// Submit a claim and wait for inclusion. Success only on an accepted
    /// terminal status; anything else surfaces as `ClaimFailed` carrying
    /// the chain status.
    pub async fn submit_claim(
        &self,
        hash: PaymentHash,
        preimage: &[u8],
    ) -> Result<String, GatewayError> {
        let (low, high) = hash.to_words();
        let mut calldata = vec![
            crate::calldata::felt_hex(low),
            crate::calldata::felt_hex(high),
        ];
        calldata.extend(encode_preimage(preimage).flatten());

        let escrow = self.config.escrow_address.as_str().to_string();
        let tx_hash = self.submit_with_nonce(&escrow, "claim", calldata).await?;

        let status = self.rpc.wait_for_inclusion(&tx_hash).await?;
        if !status.is_success() {
            return Err(GatewayError::ClaimFailed {
                tx_hash,
                status: status.to_string(),
            });
        }
        info!("[sb-gateway] claim {} included: {}", hash, tx_hash);
        Ok(tx_hash)
    }

    /// Submit a token transfer of `amount_sats` (scaled to token units)
    /// and wait for inclusion. Returns the transaction hash and the unit
    /// amount moved.
    pub async fn submit_transfer(
        &self,
        recipient: &ChainAddress,
        amount_sats: u64,
    ) -> Result<(String, U256), GatewayError> {
        if amount_sats == 0 {
            return Err(GatewayError::ZeroAmount);
        }
        let amount_units = sats_to_token_units(amount_sats, self.config.token_decimals)?;
        let [low, high] = u256_calldata(amount_units);
        let calldata = vec![recipient.as_str().to_string(), low, high];

        let token = self.config.token_address.as_str().to_string();
        let tx_hash = self.submit_with_nonce(&token, "transfer", calldata).await?;

        let status = self.rpc.wait_for_inclusion(&tx_hash).await?;
        if !status.is_success() {
            return Err(GatewayError::TransferFailed {
                tx_hash,
                status: status.to_string(),
            });
        }
        info!(
            "[sb-gateway] transfer of {} units to {} included: {}",
            amount_units, recipient, tx_hash
        );
        Ok((tx_hash, amount_units))
    }

    /// The serialized lane. Seeds lazily, assigns the current counter,
    /// advances before submission, and re-seeds only on nonce-desync
    /// errors; any other failure keeps the counter advanced because the
    /// submission attempt consumed its intent.
    async fn submit_with_nonce(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
    ) -> Result<String, GatewayError> {
        let mut slot = self.nonce.lock().await;

        let nonce = match *slot {
            Some(n) => n,
            None => {
                let seeded = self.rpc.operator_nonce().await?;
                debug!("[sb-gateway] nonce lane seeded at {}", seeded);
                seeded
            }
        };
        *slot = Some(nonce + 1);

        match self
            .rpc
            .invoke(contract, entrypoint, calldata, nonce)
            .await
        {
            Ok(tx_hash) => Ok(tx_hash),
            Err(error) => {
                if error.is_nonce_desync() {
                    warn!("[sb-gateway] nonce desync, lane will re-seed: {}", error);
                    *slot = None;
                }
                Err(error)
            }
        }
    }
}
