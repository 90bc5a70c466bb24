//! # Gateway Adapters
//!
//! Two [`crate::ports::ChainRpc`] implementations: a JSON-RPC client for a
//! real node, and an embedded chain driving an in-process escrow vault for
//! tests and local development.

mod embedded;
mod rpc_client;

pub use embedded::EmbeddedChain;
pub use rpc_client::JsonRpcChainClient;
