//! Application configuration model.
//!
//! Every field has a default, so an absent or partial `config.toml` is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Local development node endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:7545";

/// Address of the deployed Delance contract.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// How often a pending transaction's receipt is polled.
    pub confirmation_poll_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            confirmation_poll_ms: 500,
        }
    }
}

impl LedgerConfig {
    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_ms.max(1))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Attempts per read-refresh, including the first one.
    pub refresh_attempts: u32,
    pub refresh_retry_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_attempts: 2,
            refresh_retry_delay_ms: 250,
        }
    }
}

impl SessionConfig {
    pub fn refresh_retry_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_retry_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ledger.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.session.refresh_attempts, 2);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [ledger]
            rpc_url = "http://localhost:8545"
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger.rpc_url, "http://localhost:8545");
        assert_eq!(config.ledger.contract_address, DEFAULT_CONTRACT_ADDRESS);
        assert_eq!(config.ledger.confirmation_poll_ms, 500);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let ledger = LedgerConfig {
            confirmation_poll_ms: 0,
            ..LedgerConfig::default()
        };
        assert_eq!(ledger.confirmation_poll_interval(), Duration::from_millis(1));
    }
}
