//! # Orchestrator Adapters
//!
//! The REST client backing [`crate::ports::LightningRpc`] against a Core
//! Lightning node.

mod rest;

pub use rest::ClnRestClient;
