//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_version` is empty or contains `:`
    /// - either TTL is zero
    /// - `max_provider_concurrency` is 0 or above 16
    /// - `provider_timeout_ms` is less than 1s or exceeds 10 minutes
    /// - `max_images` is 0 or above 50
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        // The token is the key prefix up to the first ':'.
        if self.cache_version.contains(':') {
            return Err(invalid("cache_version", "must not contain ':'"));
        }

        if self.insights_ttl_secs == 0 {
            return Err(invalid("insights_ttl_secs", "must be greater than 0"));
        }
        if self.images_ttl_secs == 0 {
            return Err(invalid("images_ttl_secs", "must be greater than 0"));
        }

        if self.max_provider_concurrency == 0 || self.max_provider_concurrency > 16 {
            return Err(invalid("max_provider_concurrency", "must be between 1 and 16"));
        }

        if self.provider_timeout_ms < 1_000 || self.provider_timeout_ms > 600_000 {
            return Err(invalid("provider_timeout_ms", "must be between 1000 and 600000"));
        }

        if self.max_images == 0 || self.max_images > 50 {
            return Err(invalid("max_images", "must be between 1 and 50"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.cache_only && (self.ai_api_key.is_some() || self.brave_api_key.is_some()) {
            tracing::warn!("cache_only is set; configured provider keys will not be used");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_cache_version_with_separator() {
        let config = AppConfig { cache_version: "v1:beta".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_empty_cache_version() {
        let config = AppConfig { cache_version: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = AppConfig { max_provider_concurrency: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_provider_concurrency"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { images_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "images_ttl_secs"));
    }

    #[test]
    fn test_validate_max_images_bounds() {
        let config = AppConfig { max_images: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { max_images: 50, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }
}
