//! # Orchestrator Service

mod orchestrator;

pub use orchestrator::{PayOutcome, PayRequest, PaymentOrchestrator, PaymentPolicy};
