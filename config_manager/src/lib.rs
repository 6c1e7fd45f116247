use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// General system settings
    pub system: SystemSettings,

    /// LI.FI transfer-analytics endpoint configuration
    pub lifi: LifiApiConfig,

    /// Fetch cycle configuration
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Enable debug mode
    pub debug_mode: bool,

    /// Start with the BTC asset filter enabled
    pub btc_filter_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifiApiConfig {
    /// Transfer-analytics endpoint URL
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Records requested per page (the endpoint caps at 1000)
    pub page_limit: u32,

    /// Attempts per page request, including the first one
    pub retry_max_attempts: u32,

    /// Fixed wait between attempts in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Hard cap on pages per fetch cycle
    pub max_pages: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            system: SystemSettings {
                debug_mode: false,
                btc_filter_default: true,
            },
            lifi: LifiApiConfig {
                api_base_url: "https://li.quest/v2/analytics/transfers".to_string(),
                request_timeout_seconds: 30,
                page_limit: 1000,
                retry_max_attempts: 3,
                retry_delay_ms: 1000,
            },
            fetch: FetchConfig { max_pages: 100 },
        }
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        // Add config file if it exists
        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // Add environment variables with prefix
        config_builder = config_builder.add_source(
            Environment::with_prefix("TRACKER")
                .try_parsing(true)
                .separator("__"),
        );

        let config = config_builder.build()?;
        let system_config: SystemConfig = config.try_deserialize()?;

        system_config.validate()?;
        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.lifi.request_timeout_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.lifi.page_limit == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Page limit must be greater than 0".to_string(),
            ));
        }

        if self.lifi.retry_max_attempts == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Retry attempt budget must include at least one attempt".to_string(),
            ));
        }

        if self.fetch.max_pages == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Page cap must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
