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

/// Font stylesheets beyond this count still install, but are unusual.
const MAX_FONT_STYLESHEETS: usize = 3;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `app_name` is empty or contains whitespace
    /// - `origin`, a font origin, or a precache entry is not a usable URL
    ///
    /// Returns `ConfigError::Missing` if `cache_version` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.app_name.is_empty() || self.app_name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "app_name".into(),
                reason: "must be non-empty and contain no whitespace".into(),
            });
        }

        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set LANTERN_CACHE_VERSION to the deploy's version token".into(),
            });
        }

        let origin = self.origin_url()?;
        self.font_origin_urls()?;
        let precache = self.precache_urls()?;

        let font_sheets = precache
            .iter()
            .filter(|url| url.origin() != origin.origin())
            .count();
        if font_sheets > MAX_FONT_STYLESHEETS {
            tracing::warn!(
                cross_origin_entries = font_sheets,
                "precache lists more than {} cross-origin entries",
                MAX_FONT_STYLESHEETS
            );
        }

        Ok(())
    }
}
