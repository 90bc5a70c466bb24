//! # satbridge Chain Gateway
//!
//! The typed off-chain interface to the escrow chain. Reads locked
//! positions, submits claims and token transfers on behalf of the
//! operator, serializes nonce assignment through a single FIFO lane,
//! waits for inclusion, and maps chain-level failures to typed errors.
//!
//! ## Nonce lane
//!
//! Every operator transaction flows through one serialized lane: the
//! counter seeds lazily from the chain, each submission takes the current
//! value and advances the counter before submitting, and an error whose
//! message names a nonce problem invalidates the counter so the next call
//! re-seeds. Any other error leaves the counter advanced: the submission
//! attempt consumed its intent, and retry policy belongs to the caller.
//!
//! ## Module structure
//!
//! ```text
//! sb-chain-gateway/
//! ├── domain/          # LockedPosition, TxStatus, phase decoding, errors
//! ├── calldata.rs      # u256 limb split, byte-array encoding
//! ├── ports/           # ChainRpc + mock
//! ├── adapters/        # JSON-RPC client, embedded in-process chain
//! └── gateway.rs       # ChainGateway service
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod calldata;
pub mod domain;
pub mod gateway;
pub mod ports;

// Re-exports
pub use adapters::{EmbeddedChain, JsonRpcChainClient};
pub use calldata::{encode_preimage, felt_hex, ByteArrayCalldata};
pub use domain::{decode_position, parse_phase, GatewayError, LockedPosition, TxStatus};
pub use gateway::{ChainGateway, GatewayConfig};
pub use ports::{ChainRpc, MockChainRpc};

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
