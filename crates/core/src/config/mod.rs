//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWINGSET_*)
//! 2. TOML config file (if SWINGSET_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWINGSET_*)
/// 2. TOML config file (if SWINGSET_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SWINGSET_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for outbound HTTP requests.
    ///
    /// Set via SWINGSET_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SWINGSET_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Namespace token prefixed to every cache key.
    ///
    /// Bump it whenever the insight schema or scoring rules change; every
    /// entry minted under the old token becomes unreachable.
    /// Set via SWINGSET_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Lifetime of cached insights, in seconds.
    #[serde(default = "default_insights_ttl_secs")]
    pub insights_ttl_secs: u64,

    /// Lifetime of cached image lists, in seconds.
    #[serde(default = "default_images_ttl_secs")]
    pub images_ttl_secs: u64,

    /// Maximum concurrent calls to the AI insight provider.
    ///
    /// Set via SWINGSET_MAX_PROVIDER_CONCURRENCY environment variable.
    #[serde(default = "default_max_provider_concurrency")]
    pub max_provider_concurrency: usize,

    /// Upper bound on waiting for a provider slot plus the call itself.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Maximum number of images returned and cached per entity.
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Serve from cache only; misses are never sent to providers.
    #[serde(default)]
    pub cache_only: bool,

    /// API key for the OpenAI-compatible insight provider.
    ///
    /// Set via SWINGSET_AI_API_KEY environment variable.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Base URL of the insight provider.
    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,

    /// Model requested from the insight provider.
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Brave API subscription token for image search.
    ///
    /// Set via SWINGSET_BRAVE_API_KEY environment variable.
    #[serde(default)]
    pub brave_api_key: Option<String>,

    /// Base URL of the Nominatim-compatible reverse geocoder.
    #[serde(default = "default_geocoder_base_url")]
    pub geocoder_base_url: String,

    /// Minimum spacing between geocoder requests in milliseconds.
    #[serde(default = "default_geocoder_min_interval_ms")]
    pub geocoder_min_interval_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swingset-cache.sqlite")
}

fn default_user_agent() -> String {
    "swingset/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_insights_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_images_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_max_provider_concurrency() -> usize {
    2
}

fn default_provider_timeout_ms() -> u64 {
    45_000
}

fn default_max_images() -> usize {
    crate::images::DEFAULT_MAX_IMAGES
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".into()
}

fn default_geocoder_base_url() -> String {
    "https://nominatim.openstreetmap.org".into()
}

fn default_geocoder_min_interval_ms() -> u64 {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_version: default_cache_version(),
            insights_ttl_secs: default_insights_ttl_secs(),
            images_ttl_secs: default_images_ttl_secs(),
            max_provider_concurrency: default_max_provider_concurrency(),
            provider_timeout_ms: default_provider_timeout_ms(),
            max_images: default_max_images(),
            cache_only: false,
            ai_api_key: None,
            ai_base_url: default_ai_base_url(),
            ai_model: default_ai_model(),
            brave_api_key: None,
            geocoder_base_url: default_geocoder_base_url(),
            geocoder_min_interval_ms: default_geocoder_min_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn insights_ttl(&self) -> Duration {
        Duration::from_secs(self.insights_ttl_secs)
    }

    pub fn images_ttl(&self) -> Duration {
        Duration::from_secs(self.images_ttl_secs)
    }

    pub fn geocoder_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocoder_min_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWINGSET_`
    /// 2. TOML file from `SWINGSET_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWINGSET_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWINGSET_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the insight provider key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_ai_api_key(&self) -> Result<&str, ConfigError> {
        self.ai_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "ai_api_key".into(),
            hint: "Set SWINGSET_AI_API_KEY environment variable".into(),
        })
    }

    /// Check if Brave API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the Brave API key is not set.
    pub fn require_brave_api_key(&self) -> Result<&str, ConfigError> {
        self.brave_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "brave_api_key".into(),
            hint: "Set SWINGSET_BRAVE_API_KEY environment variable".into(),
        })
    }
}
