//! # Configuration
//!
//! Application configuration loading and management.
//!
//! Configuration drives both demo binaries: which node to talk to, which
//! key signs, how transactions are priced, and how logs are emitted.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override
//! earlier):
//! 1. Default values
//! 2. Configuration file (if exists)
//! 3. Environment variables (prefixed with `ETH_SANDBOX_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ETH_SANDBOX_CONFIG_FILE` | Config file path | `eth-sandbox.toml` |
//! | `ETH_SANDBOX_RPC_URL` | JSON-RPC endpoint | `http://localhost:8545` |
//! | `ETH_SANDBOX_CHAIN_ID` | Pinned chain id | auto-detect |
//! | `ETH_SANDBOX_GAS_STRATEGY` | `legacy` or `eip1559` | `eip1559` |
//! | `ETH_SANDBOX_PRIVATE_KEY` | Hex signing key | unset |
//! | `ETH_SANDBOX_RECEIPT_TIMEOUT_MS` | Receipt wait bound | `90000` |
//! | `ETH_SANDBOX_PRIORITY` | `slow`, `standard`, `fast` | `standard` |
//! | `ETH_SANDBOX_LOG_LEVEL` | Log level | `info` |
//! | `ETH_SANDBOX_LOG_FORMAT` | Log format (json/pretty) | `pretty` |
//!
//! # Examples
//!
//! ```ignore
//! use eth_sandbox::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("node: {}", config.node.rpc_url);
//! ```

use crate::chain::gas::{GasStrategy, TxPriority};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Required configuration value is missing.
    #[error("missing config value: {field}")]
    MissingValue {
        /// Field name.
        field: String,
    },
}

// ============================================================================
// Node Configuration
// ============================================================================

/// Ethereum node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// HTTP JSON-RPC endpoint URL.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Expected chain id; unset means detect from the node.
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Fee quoting strategy.
    #[serde(default)]
    pub gas_strategy: GasStrategy,

    /// Percentage buffer over raw gas estimates.
    #[serde(default = "default_gas_buffer")]
    pub gas_buffer_percent: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: None,
            gas_strategy: GasStrategy::default(),
            gas_buffer_percent: default_gas_buffer(),
        }
    }
}

// ============================================================================
// Wallet Configuration
// ============================================================================

/// Signing key configuration.
///
/// The key is never serialized back out and never appears in `Debug`
/// output.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Hex-encoded private key.
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
}

impl WalletConfig {
    /// Returns the configured key, or an error naming the missing field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] if no key is configured.
    pub fn require_key(&self) -> Result<&str, ConfigError> {
        self.private_key
            .as_deref()
            .ok_or(ConfigError::MissingValue {
                field: "wallet.private_key".to_string(),
            })
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

// ============================================================================
// Transaction Configuration
// ============================================================================

/// Transaction submission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxConfig {
    /// Upper bound on receipt waits, in milliseconds.
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    /// Fee bidding priority.
    #[serde(default)]
    pub priority: TxPriority,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            receipt_timeout_ms: default_receipt_timeout_ms(),
            priority: TxPriority::default(),
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    Json,
    /// Human-readable format.
    #[default]
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include target (module path) in logs.
    #[serde(default)]
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            include_target: false,
        }
    }
}

impl LogConfig {
    /// Installs the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Subsequent
    /// calls are no-ops, so tests can call this freely.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.include_target);

        let _ = match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.try_init(),
        };
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Node configuration.
    #[serde(default)]
    pub node: NodeConfig,

    /// Wallet configuration.
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Transaction configuration.
    #[serde(default)]
    pub tx: TxConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables and optional
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path = std::env::var("ETH_SANDBOX_CONFIG_FILE")
            .unwrap_or_else(|_| "eth-sandbox.toml".to_string());

        if Path::new(&config_path).exists() {
            config = Self::from_file(&config_path)?;
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ETH_SANDBOX_RPC_URL") {
            self.node.rpc_url = url;
        }
        if let Ok(id) = std::env::var("ETH_SANDBOX_CHAIN_ID")
            && let Ok(parsed) = id.parse()
        {
            self.node.chain_id = Some(parsed);
        }
        if let Ok(strategy) = std::env::var("ETH_SANDBOX_GAS_STRATEGY")
            && let Ok(parsed) = strategy.parse()
        {
            self.node.gas_strategy = parsed;
        }

        if let Ok(key) = std::env::var("ETH_SANDBOX_PRIVATE_KEY") {
            self.wallet.private_key = Some(key);
        }

        if let Ok(timeout) = std::env::var("ETH_SANDBOX_RECEIPT_TIMEOUT_MS")
            && let Ok(parsed) = timeout.parse()
        {
            self.tx.receipt_timeout_ms = parsed;
        }
        if let Ok(priority) = std::env::var("ETH_SANDBOX_PRIORITY")
            && let Ok(parsed) = priority.parse()
        {
            self.tx.priority = parsed;
        }

        if let Ok(level) = std::env::var("ETH_SANDBOX_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Ok(format) = std::env::var("ETH_SANDBOX_LOG_FORMAT") {
            self.log.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.node.rpc_url.starts_with("http://") && !self.node.rpc_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "node.rpc_url".to_string(),
                message: format!("'{}' is not an http(s) url", self.node.rpc_url),
            });
        }

        if self.tx.receipt_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tx.receipt_timeout_ms".to_string(),
                message: "receipt wait bound must be non-zero".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log.level".to_string(),
                message: format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_gas_buffer() -> u64 {
    20
}

fn default_receipt_timeout_ms() -> u64 {
    90_000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.node.rpc_url, "http://localhost:8545");
        assert_eq!(config.node.chain_id, None);
        assert_eq!(config.node.gas_strategy, GasStrategy::Eip1559);
        assert_eq!(config.tx.receipt_timeout_ms, 90_000);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn app_config_validate_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn app_config_validate_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.node.rpc_url = "ws://localhost:8546".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn app_config_validate_rejects_bad_level() {
        let mut config = AppConfig::default();
        config.log.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn app_config_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.tx.receipt_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [node]
            rpc_url = "https://rpc.sepolia.org"
            chain_id = 11155111

            [tx]
            priority = "fast"
            "#,
        )
        .unwrap();

        assert_eq!(config.node.rpc_url, "https://rpc.sepolia.org");
        assert_eq!(config.node.chain_id, Some(11_155_111));
        assert_eq!(config.node.gas_buffer_percent, 20);
        assert_eq!(config.tx.priority, TxPriority::Fast);
        assert_eq!(config.tx.receipt_timeout_ms, 90_000);
        assert!(config.wallet.private_key.is_none());
    }

    #[test]
    fn wallet_key_parses_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [wallet]
            private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            "#,
        )
        .unwrap();
        assert!(config.wallet.require_key().is_ok());
    }

    #[test]
    fn require_key_names_missing_field() {
        let config = WalletConfig::default();
        let error = config.require_key().unwrap_err();
        assert!(error.to_string().contains("wallet.private_key"));
    }

    #[test]
    fn wallet_debug_is_redacted() {
        let config = WalletConfig {
            private_key: Some("0xac0974be".to_string()),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("ac0974be"));
    }

    #[test]
    fn wallet_key_is_never_serialized() {
        let config = AppConfig {
            wallet: WalletConfig {
                private_key: Some("0xsecret".to_string()),
            },
            ..AppConfig::default()
        };
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn log_format_default_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
