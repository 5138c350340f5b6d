//! Live fetch pipeline.
//!
//! ### Fetcher
//! - Strategy handlers talk to the network only through the [`Fetcher`] trait.
//! - Any HTTP status is a completed fetch; the handler decides whether to store it.
//! - Transport errors, timeouts, and oversized bodies are failures and trigger
//!   the handler's fallback path.
//!
//! ### FetchClient
//! - rustls, gzip/brotli/deflate decoding
//! - Max redirects: 5
//! - Max body bytes: 10MB (configurable)
//! - Timeout: the client's own, no extra layer on top

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize};

use crate::request::InterceptedRequest;
use lantern_core::{AppConfig, Error, ResponseRecord};

/// Connection-level headers that never travel with a stored response.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Whether a header is connection-level and must not be forwarded or stored.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Performs live network fetches on behalf of the strategy handlers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a request from the network.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseRecord, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "lantern/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "lantern/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// Header value as text. Non-ASCII bytes are decoded as UTF-8, lossily.
pub fn header_text(value: &header::HeaderValue) -> String {
    match value.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("no response within {}ms", timeout.as_millis()))
    } else {
        Error::Network(err.to_string())
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseRecord, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) && !name.eq_ignore_ascii_case("host") {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.config.timeout))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()) && name.as_str() != header::CONTENT_LENGTH.as_str())
            .map(|(name, value)| (name.as_str().to_string(), header_text(value)))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, self.config.timeout))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(ResponseRecord::new(request.url.as_str(), status.as_u16(), headers, bytes))
    }
}
