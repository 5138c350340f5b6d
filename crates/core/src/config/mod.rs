//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LANTERN_*)
//! 2. TOML config file (if LANTERN_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::policy::PartitionNames;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LANTERN_*)
/// 2. TOML config file (if LANTERN_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// Set via LANTERN_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for live fetches.
    ///
    /// Set via LANTERN_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via LANTERN_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LANTERN_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Application token used as the partition name prefix.
    ///
    /// Set via LANTERN_APP_NAME environment variable.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Version token embedded in every partition name. Bump it on deploy
    /// to invalidate all previous partitions at the next activation.
    ///
    /// Set via LANTERN_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version", deserialize_with = "version_token")]
    pub cache_version: String,

    /// The website's own origin. Relative precache entries and origin-form
    /// requests are resolved against it.
    ///
    /// Set via LANTERN_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Font-provider origins whose responses are cached without expiry.
    ///
    /// Set via LANTERN_FONT_ORIGINS environment variable (TOML array syntax).
    #[serde(default = "default_font_origins")]
    pub font_origins: Vec<String>,

    /// Install manifest: URLs pre-populated into the static partition.
    ///
    /// Set via LANTERN_PRECACHE environment variable (TOML array syntax).
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Listen address for the proxy front end.
    ///
    /// Set via LANTERN_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./lantern-cache.sqlite")
}

fn default_user_agent() -> String {
    "lantern/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_app_name() -> String {
    "church".into()
}

fn default_cache_version() -> String {
    "1".into()
}

/// Accept `cache_version = 3` as well as `cache_version = "3"`.
fn version_token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Text(String),
        Number(u64),
    }

    Ok(match Token::deserialize(deserializer)? {
        Token::Text(s) => s,
        Token::Number(n) => n.to_string(),
    })
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_font_origins() -> Vec<String> {
    vec!["https://fonts.googleapis.com".into(), "https://fonts.gstatic.com".into()]
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/manifest.json",
        "/favicon.ico",
        "/icons/icon-192.png",
        "/icons/icon-512.png",
        "/images/sanctuary.jpg",
        "/images/worship.jpg",
        "/images/community.jpg",
        "https://fonts.googleapis.com/css2?family=Cormorant+Garamond:wght@400;600&display=swap",
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600&display=swap",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            font_origins: default_font_origins(),
            precache: default_precache(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The three version-tagged partition names for this deployment.
    pub fn partition_names(&self) -> PartitionNames {
        PartitionNames::new(&self.app_name, &self.cache_version)
    }

    /// The configured origin as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        parse_http_url("origin", &self.origin)
    }

    /// Font-provider origins as parsed URLs.
    pub fn font_origin_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.font_origins
            .iter()
            .map(|o| parse_http_url("font_origins", o))
            .collect()
    }

    /// Precache entries resolved against the origin, in manifest order.
    pub fn precache_urls(&self) -> Result<Vec<Url>, ConfigError> {
        let origin = self.origin_url()?;
        self.precache
            .iter()
            .map(|entry| {
                origin.join(entry.trim()).map_err(|e| ConfigError::Invalid {
                    field: "precache".into(),
                    reason: format!("{entry}: {e}"),
                })
            })
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LANTERN_`
    /// 2. TOML file from `LANTERN_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("LANTERN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LANTERN_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::Invalid { field: field.into(), reason: format!("{raw}: {e}") })?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ConfigError::Invalid { field: field.into(), reason: format!("{raw}: must be an http(s) URL") }),
    }
}
