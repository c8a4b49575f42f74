//! Configuration module
//!
//! Loads configuration from TOML files with `.env` and environment variable
//! overrides, and provides structured configuration types.

use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Retry and escalation policy
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Signing account
    #[serde(default)]
    pub account: AccountConfig,

    /// Logging and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// HTTP JSON-RPC URL
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Retries for read-only queries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Outer attempts on submission failure (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Time to wait for inclusion before escalating the fee
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Fixed pause after a failed attempt
    #[serde(default = "default_failure_cooldown")]
    pub failure_cooldown_secs: u64,

    /// Minimum fee increase on resubmission, in percent
    #[serde(default = "default_min_fee_bump")]
    pub min_fee_bump_percent: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Hex address; falls back to the node's first account when unset
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Debug-level logs for this crate
    #[serde(default)]
    pub verbose: bool,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_rpc_url() -> String { "http://127.0.0.1:8545".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 3 }
fn default_poll_interval() -> u64 { 1_000 }
fn default_max_attempts() -> u32 { 2 }
fn default_confirmation_timeout() -> u64 { 180 }
fn default_failure_cooldown() -> u64 { 30 }
fn default_min_fee_bump() -> u32 { 10 }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
            max_retries: default_max_retries(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            failure_cooldown_secs: default_failure_cooldown(),
            min_fee_bump_percent: default_min_fee_bump(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            json_logs: false,
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SubmissionConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_secs(self.failure_cooldown_secs)
    }
}

impl AccountConfig {
    /// Parsed account address, if configured
    pub fn parsed_address(&self) -> Result<Option<Address>, ConfigError> {
        self.address
            .as_deref()
            .map(|raw| {
                raw.parse::<Address>().map_err(|e| {
                    ConfigError::Validation(format!("Invalid account address {}: {}", raw, e))
                })
            })
            .transpose()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read config file {}: {}", path, e)))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration with `.env` and environment variable overrides
    ///
    /// Recognised variables: `LEDGER_RPC_URL`, `LEDGER_ACCOUNT`.
    pub fn from_file_with_env(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LEDGER_RPC_URL") {
            self.rpc.url = url;
        }
        if let Ok(account) = std::env::var("LEDGER_ACCOUNT") {
            self.account.address = Some(account);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.url.starts_with("http://") && !self.rpc.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "Invalid URL format: {}",
                self.rpc.url
            )));
        }

        if self.rpc.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "rpc.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.rpc.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "rpc.poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.submission.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "submission.max_attempts must be > 0".to_string(),
            ));
        }

        if self.submission.confirmation_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "submission.confirmation_timeout_secs must be > 0".to_string(),
            ));
        }

        self.account.parsed_address()?;

        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
