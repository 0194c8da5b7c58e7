//! Application settings (spec §6.4).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub order_limits: OrderLimits,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    /// Minimum intent-classification confidence before a classification is
    /// accepted; below this the intent is coerced to `UNKNOWN` (spec §4.2).
    #[serde(default = "default_ai_confidence_threshold")]
    pub ai_confidence_threshold: f32,

    /// Weighted safety score at or above which an utterance is blocked
    /// outright (spec §4.1).
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: u32,
}

fn default_ai_confidence_threshold() -> f32 {
    0.8
}

fn default_safety_threshold() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLimits {
    #[serde(default = "default_max_quantity_per_item")]
    pub max_quantity_per_item: u32,
    #[serde(default = "default_max_items_per_order")]
    pub max_items_per_order: u32,
    #[serde(default = "default_max_order_total")]
    pub max_order_total: f64,
}

fn default_max_quantity_per_item() -> u32 {
    10
}

fn default_max_items_per_order() -> u32 {
    50
}

fn default_max_order_total() -> f64 {
    200.0
}

impl Default for OrderLimits {
    fn default() -> Self {
        Self {
            max_quantity_per_item: default_max_quantity_per_item(),
            max_items_per_order: default_max_items_per_order(),
            max_order_total: default_max_order_total(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub enable_inventory_checking: bool,
    #[serde(default = "default_true")]
    pub enable_customization_validation: bool,
    #[serde(default)]
    pub allow_negative_inventory: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_inventory_checking: true,
            enable_customization_validation: true,
            allow_negative_inventory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_canned_phrase_bucket")]
    pub canned_phrase_prefix: String,
    #[serde(default = "default_tts_cache_prefix")]
    pub tts_cache_prefix: String,
    /// Base URL of the speech-to-text sidecar `transcribe` is sent to.
    #[serde(default = "default_stt_endpoint")]
    pub stt_endpoint: String,
    /// Base URL of the text-to-speech sidecar `synthesize` is sent to.
    #[serde(default = "default_tts_endpoint")]
    pub tts_endpoint: String,
    #[serde(default = "default_vendor_timeout_ms")]
    pub vendor_timeout_ms: u64,
}

fn default_tts_voice() -> String {
    "nova".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_canned_phrase_bucket() -> String {
    "canned-phrases".to_string()
}

fn default_tts_cache_prefix() -> String {
    "tts-cache".to_string()
}

fn default_stt_endpoint() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_tts_endpoint() -> String {
    "http://127.0.0.1:8091".to_string()
}

fn default_vendor_timeout_ms() -> u64 {
    8000
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_voice: default_tts_voice(),
            default_language: default_language(),
            canned_phrase_prefix: default_canned_phrase_bucket(),
            tts_cache_prefix: default_tts_cache_prefix(),
            stt_endpoint: default_stt_endpoint(),
            tts_endpoint: default_tts_endpoint(),
            vendor_timeout_ms: default_vendor_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
}

fn default_llm_model() -> String {
    "qwen2.5:7b-instruct-q4_K_M".to_string()
}

fn default_llm_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    10_000
}

fn default_llm_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            endpoint: default_llm_endpoint(),
            timeout_ms: default_llm_timeout_ms(),
            max_retries: default_llm_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_s3_bucket")]
    pub s3_bucket: String,
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost/drivethru".to_string()
}

fn default_s3_bucket() -> String {
    "drivethru-assets".to_string()
}

fn default_session_ttl_seconds() -> u64 {
    900
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            database_url: default_database_url(),
            s3_bucket: default_s3_bucket(),
            session_ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    512
}

fn default_timeout_seconds() -> u64 {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            timeout_seconds: default_timeout_seconds(),
            cors_enabled: false,
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Bearer-token auth for the HTTP surface (spec §6.1 names no auth scheme;
/// this guards the kiosk-facing endpoints the way the order-taking terminal
/// itself would be provisioned, off by default for local development).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst_multiplier")]
    pub burst_multiplier: f32,
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst_multiplier() -> f32 {
    1.5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_requests_per_second(),
            burst_multiplier: default_burst_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_order_limits()?;
        self.validate_thresholds()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_order_limits(&self) -> Result<(), ConfigError> {
        let limits = &self.order_limits;
        if limits.max_quantity_per_item == 0 {
            return Err(ConfigError::InvalidValue {
                field: "order_limits.max_quantity_per_item".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if limits.max_items_per_order == 0 {
            return Err(ConfigError::InvalidValue {
                field: "order_limits.max_items_per_order".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if limits.max_order_total <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "order_limits.max_order_total".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ai_confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "ai_confidence_threshold".to_string(),
                message: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.ai_confidence_threshold
                ),
            });
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }
        if server.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_connections".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty() {
            tracing::warn!(
                "cors enabled in production with no configured origins; \
                 this will block every browser client"
            );
        }
        if server.auth.enabled && server.auth.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.api_key".to_string(),
                message: "auth is enabled but no api_key is configured".to_string(),
            });
        }
        if self.environment.is_production() && !server.auth.enabled {
            tracing::warn!("API authentication is disabled in a production environment");
        }
        Ok(())
    }
}

/// Load settings, layering `config/default.toml` under an optional
/// `config/{environment}.toml` under `DRIVETHRU_`-prefixed environment
/// variables (`DRIVETHRU_SERVER__PORT`, etc.).
pub fn load_settings(environment: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = environment {
        builder = builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DRIVETHRU")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_spec_constants() {
        let settings = Settings::default();
        assert_eq!(settings.order_limits.max_quantity_per_item, 10);
        assert_eq!(settings.order_limits.max_items_per_order, 50);
        assert_eq!(settings.order_limits.max_order_total, 200.0);
        assert_eq!(settings.ai_confidence_threshold, 0.8);
        assert_eq!(settings.safety_threshold, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_confidence_threshold() {
        let mut settings = Settings::default();
        settings.ai_confidence_threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_auth_enabled_without_api_key() {
        let mut settings = Settings::default();
        settings.server.auth.enabled = true;
        assert!(settings.validate().is_err());

        settings.server.auth.api_key = Some("secret".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn env_override_applies_over_defaults() {
        std::env::set_var("DRIVETHRU_SERVER__PORT", "9090");
        let settings = load_settings(None).expect("settings should load from defaults + env");
        assert_eq!(settings.server.port, 9090);
        std::env::remove_var("DRIVETHRU_SERVER__PORT");
    }
}
