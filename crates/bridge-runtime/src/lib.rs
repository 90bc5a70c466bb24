//! # satbridge Runtime Library
//!
//! Configuration, the operator HTTP surface, and invoice description
//! tagging. The `satbridged` binary wires these together; the invoice
//! issuance collaborator links against [`tags`] to stamp descriptions
//! with the configured secret.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod http;
pub mod tags;

pub use config::{BridgeConfig, ConfigError};
pub use http::{operator_router, AppState};
pub use tags::{tag_description, verify_description_tag};

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
