//! # Runtime Configuration
//!
//! Environment-driven configuration for the bridge runtime. Every option
//! is read from an `SB_`-prefixed variable, validated against the ranges
//! the components require.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SB_CHAIN_RPC_URL` | `http://127.0.0.1:5050` | Chain node JSON-RPC endpoint |
//! | `SB_OPERATOR_PRIVATE_KEY` | - | Operator signing credential (required) |
//! | `SB_ESCROW_ADDRESS` | - | Escrow contract address (required) |
//! | `SB_TOKEN_ADDRESS` | - | Token contract address (required) |
//! | `SB_TOKEN_DECIMALS` | `8` | Token decimals, 8..=77 |
//! | `SB_LIGHTNING_REST_URL` | `http://127.0.0.1:3010` | CLN REST endpoint |
//! | `SB_LIGHTNING_AUTH_TOKEN_PATH` | `./data/rune` | Rune token file |
//! | `SB_TAG_SECRET` | - | HMAC key for invoice description tags (>= 16 bytes) |
//! | `SB_MAX_FEE_PERCENT` | `0.5` | Lightning fee ceiling |
//! | `SB_PAY_RETRY_FOR_SECONDS` | `30` | Lightning pay retry window |
//! | `SB_INVOICE_MONITOR_INTERVAL_MS` | `15000` | Monitor tick interval |
//! | `SB_INVOICE_MONITOR_RETRY_MS` | `60000` | Credit retry delay |
//! | `SB_INVOICE_MONITOR_STALE_MS` | `300000` | Stale-processing threshold |
//! | `SB_DATA_FILE_PATH` | `./data/bridge.json` | Persistent store path |
//! | `SB_LISTEN_PORT` | `8080` | Public request surface port |
//! | `SB_OPERATOR_SERVICE_PORT` | `8081` | Operator service port |
//! | `SB_ALLOW_EXTERNAL` | `false` | Bind the operator service beyond localhost |

use sb_types::ChainAddress;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable failed validation.
    #[error("invalid configuration {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong.
        reason: String,
    },
}

/// The full runtime configuration.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Chain node JSON-RPC endpoint.
    pub chain_rpc_url: String,
    /// Operator signing credential, handed to the node-side signer.
    pub operator_private_key: String,
    /// Escrow contract address.
    pub escrow_address: ChainAddress,
    /// Token contract address.
    pub token_address: ChainAddress,
    /// Token decimals, 8..=77.
    pub token_decimals: u32,
    /// CLN REST endpoint.
    pub lightning_rest_url: String,
    /// Path to the rune auth token file.
    pub lightning_auth_token_path: PathBuf,
    /// HMAC key for invoice description tags; >= 16 bytes when set.
    pub tag_secret: Option<Vec<u8>>,
    /// Lightning fee ceiling, percent.
    pub max_fee_percent: f64,
    /// Lightning pay retry window, seconds.
    pub pay_retry_for_seconds: u64,
    /// Monitor tick interval, milliseconds.
    pub invoice_monitor_interval_ms: u64,
    /// Credit retry delay, milliseconds.
    pub invoice_monitor_retry_ms: u64,
    /// Stale-processing threshold, milliseconds.
    pub invoice_monitor_stale_ms: u64,
    /// Persistent store path.
    pub data_file_path: PathBuf,
    /// Public request surface port.
    pub listen_port: u16,
    /// Operator service port.
    pub operator_service_port: u16,
    /// Bind the operator service beyond localhost.
    pub allow_external: bool,
}

impl BridgeConfig {
    /// Read configuration from the environment and validate it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            chain_rpc_url: var_or("SB_CHAIN_RPC_URL", "http://127.0.0.1:5050"),
            operator_private_key: env::var("SB_OPERATOR_PRIVATE_KEY")
                .map_err(|_| ConfigError::Missing("SB_OPERATOR_PRIVATE_KEY"))?,
            escrow_address: parse_address("SB_ESCROW_ADDRESS")?,
            token_address: parse_address("SB_TOKEN_ADDRESS")?,
            token_decimals: parse_number("SB_TOKEN_DECIMALS", 8)?,
            lightning_rest_url: var_or("SB_LIGHTNING_REST_URL", "http://127.0.0.1:3010"),
            lightning_auth_token_path: PathBuf::from(var_or(
                "SB_LIGHTNING_AUTH_TOKEN_PATH",
                "./data/rune",
            )),
            tag_secret: env::var("SB_TAG_SECRET").ok().map(|s| s.into_bytes()),
            max_fee_percent: parse_float("SB_MAX_FEE_PERCENT", 0.5)?,
            pay_retry_for_seconds: parse_number("SB_PAY_RETRY_FOR_SECONDS", 30)?,
            invoice_monitor_interval_ms: parse_number("SB_INVOICE_MONITOR_INTERVAL_MS", 15_000)?,
            invoice_monitor_retry_ms: parse_number("SB_INVOICE_MONITOR_RETRY_MS", 60_000)?,
            invoice_monitor_stale_ms: parse_number("SB_INVOICE_MONITOR_STALE_MS", 300_000)?,
            data_file_path: PathBuf::from(var_or("SB_DATA_FILE_PATH", "./data/bridge.json")),
            listen_port: parse_number("SB_LISTEN_PORT", 8080)?,
            operator_service_port: parse_number("SB_OPERATOR_SERVICE_PORT", 8081)?,
            allow_external: env::var("SB_ALLOW_EXTERNAL")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator_private_key.trim().is_empty() {
            return Err(ConfigError::Missing("SB_OPERATOR_PRIVATE_KEY"));
        }
        if !(8..=77).contains(&self.token_decimals) {
            return Err(ConfigError::Invalid {
                name: "SB_TOKEN_DECIMALS",
                reason: format!("{} outside [8, 77]", self.token_decimals),
            });
        }
        if let Some(secret) = &self.tag_secret {
            if secret.len() < 16 {
                return Err(ConfigError::Invalid {
                    name: "SB_TAG_SECRET",
                    reason: format!("{} bytes, need at least 16", secret.len()),
                });
            }
        }
        if !(0.0..=100.0).contains(&self.max_fee_percent) {
            return Err(ConfigError::Invalid {
                name: "SB_MAX_FEE_PERCENT",
                reason: format!("{} outside [0, 100]", self.max_fee_percent),
            });
        }
        if self.invoice_monitor_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "SB_INVOICE_MONITOR_INTERVAL_MS",
                reason: "cannot be 0".to_string(),
            });
        }
        if self.listen_port == self.operator_service_port {
            return Err(ConfigError::Invalid {
                name: "SB_OPERATOR_SERVICE_PORT",
                reason: "must differ from SB_LISTEN_PORT".to_string(),
            });
        }
        Ok(())
    }

    /// The operator service bind address: localhost unless external
    /// exposure was explicitly allowed.
    pub fn operator_bind_addr(&self) -> std::net::SocketAddr {
        let host = if self.allow_external {
            std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
        } else {
            std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
        };
        std::net::SocketAddr::new(host, self.operator_service_port)
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_address(name: &'static str) -> Result<ChainAddress, ConfigError> {
    let raw = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    ChainAddress::parse_non_zero(&raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_number<T: std::str::FromStr + Copy>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("unparseable: {raw}"),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_float(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    parse_number(name, default)
}
