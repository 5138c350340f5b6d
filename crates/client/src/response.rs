//! Responses handed back to the intercepted caller.

use lantern_core::ResponseRecord;

/// Body of the placeholder served when nothing real is available.
pub const NOT_AVAILABLE_BODY: &str = "Resource not available";

/// Where a proxy response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from a partition.
    Cache,
    /// Fetched live by a caching strategy.
    Network,
    /// Fetched live without touching any partition.
    Passthrough,
    /// Fabricated locally.
    Synthetic,
}

impl ResponseSource {
    /// Short label used in logs and the `x-lantern-cache` header.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Cache => "hit",
            ResponseSource::Network => "miss",
            ResponseSource::Passthrough => "bypass",
            ResponseSource::Synthetic => "synthetic",
        }
    }
}

/// The response the proxy returns for one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub record: ResponseRecord,
    pub source: ResponseSource,
}

impl ProxyResponse {
    pub fn cached(record: ResponseRecord) -> Self {
        Self { record, source: ResponseSource::Cache }
    }

    pub fn network(record: ResponseRecord) -> Self {
        Self { record, source: ResponseSource::Network }
    }

    pub fn passthrough(record: ResponseRecord) -> Self {
        Self { record, source: ResponseSource::Passthrough }
    }

    /// The synthetic 404 served when neither network nor cache can answer.
    pub fn not_available(url: &str) -> Self {
        let record = ResponseRecord::new(
            url,
            404,
            vec![("content-type".into(), "text/plain; charset=utf-8".into())],
            NOT_AVAILABLE_BODY,
        );
        Self { record, source: ResponseSource::Synthetic }
    }

    pub fn status(&self) -> u16 {
        self.record.status
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == ResponseSource::Synthetic
    }
}
