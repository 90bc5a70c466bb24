//! # Orchestrator Domain
//!
//! Payment and invoice records, and the orchestration error taxonomy.

mod errors;
mod invoice;
mod record;

pub use errors::{FailureDomain, OrchestratorError};
pub use invoice::{CreditStatus, CreditSubState, InvoiceRecord, MonitorSubState};
pub use record::{ChainSubState, HistoryEvent, LightningSubState, PaymentRecord, PaymentStatus};
