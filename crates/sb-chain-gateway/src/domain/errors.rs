//! # Gateway Errors

use sb_types::TypesError;
use thiserror::Error;

/// Chain gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The position under the hash is not in the Locked phase.
    #[error("no locked escrow on chain (phase: {phase})")]
    NotLockedOnChain {
        /// Phase the chain reported.
        phase: String,
    },

    /// A claim transaction was included but did not succeed.
    #[error("claim failed on chain: tx {tx_hash} status {status}")]
    ClaimFailed {
        /// Transaction hash of the failed claim.
        tx_hash: String,
        /// Terminal chain status.
        status: String,
    },

    /// A transfer transaction was included but did not succeed.
    #[error("transfer failed on chain: tx {tx_hash} status {status}")]
    TransferFailed {
        /// Transaction hash of the failed transfer.
        tx_hash: String,
        /// Terminal chain status.
        status: String,
    },

    /// Token decimals outside [8, 77].
    #[error("token decimals {0} outside supported range [8, 77]")]
    InvalidDecimals(u32),

    /// Transfer amount must be positive.
    #[error("transfer amount must be positive")]
    ZeroAmount,

    /// A chain response could not be decoded.
    #[error("chain response decode error: {0}")]
    Decode(String),

    /// Transport or node-side RPC failure.
    #[error("chain rpc error: {0}")]
    Rpc(String),

    /// Shared type parse failure.
    #[error(transparent)]
    Types(#[from] TypesError),
}

impl GatewayError {
    /// Whether this error message names a nonce-desync condition. The
    /// lane re-seeds its counter when this returns true.
    pub fn is_nonce_desync(&self) -> bool {
        let message = self.to_string().to_ascii_lowercase();
        message.contains("nonce")
            && ["low", "used", "already", "invalid", "out of order"]
                .iter()
                .any(|needle| message.contains(needle))
    }
}
