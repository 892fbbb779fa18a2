//! Configuration for the health tracker.
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: HT__)

use std::env;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::projector::DEFAULT_WARNING_WINDOW_DAYS;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub stock: StockConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "health-tracker.db".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

/// Stock projection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    pub warning_window_days: i64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            warning_window_days: DEFAULT_WARNING_WINDOW_DAYS,
        }
    }
}

/// Chat-completion assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

/// SMS notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.twilio.com/2010-04-01".to_string(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub filter: String,
    /// Emit JSON lines instead of pretty output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "health_tracker_core=info,health_tracker_assist=info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with HT__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        Self::load_from(&format!("config/{}", env))
    }

    /// Load with an explicit config file (extension optional, file optional).
    pub fn load_from(config_file: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(config_file).required(false))
            // e.g. HT__STOCK__WARNING_WINDOW_DAYS=10 sets stock.warning_window_days
            .add_source(config::Environment::with_prefix("HT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
