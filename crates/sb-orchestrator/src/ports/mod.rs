//! # Orchestrator Ports
//!
//! The Lightning node surface the orchestrator and monitor speak to.

mod outbound;

pub use outbound::{LightningRpc, MockLightningNode};
