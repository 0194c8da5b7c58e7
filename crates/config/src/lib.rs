//! Runtime configuration for the drive-thru conversation core.
//!
//! Settings load from three layered sources, lowest priority first:
//! `config/default.toml`, an optional `config/{environment}.toml`, and
//! `DRIVETHRU_`-prefixed environment variables.

pub mod settings;

pub use settings::{
    AuthConfig, FeatureFlags, LlmConfig, ObservabilityConfig, OrderLimits, RateLimitConfig,
    RuntimeEnvironment, ServerConfig, Settings, StoreConfig, VoiceConfig, load_settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
