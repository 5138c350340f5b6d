//! Strategy handlers.
//!
//! Each handler implements one fetch policy over at most one partition and
//! always produces a [`ProxyResponse`]. Store failures are logged and never
//! change what the caller receives.
//!
//! Within one request the order is fixed: lookup, then fetch, then store,
//! then return.

mod cache_first;
mod network_first;
mod network_only;

pub use cache_first::{cache_first, cache_first_with_freshness};
pub use network_first::network_first;
pub use network_only::network_only;

use chrono::{DateTime, Utc};
use lantern_core::{Partition, ResponseRecord};

use crate::fetch::Fetcher;
use crate::request::InterceptedRequest;

/// What every handler needs besides its partition.
pub struct StrategyContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    /// Reference time for freshness checks.
    pub now: DateTime<Utc>,
}

impl<'a> StrategyContext<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher, now: Utc::now() }
    }
}

/// Partition lookup where a store error reads as a miss.
async fn lookup(partition: &Partition, request: &InterceptedRequest) -> Option<ResponseRecord> {
    match partition.get(&request.method, request.url.as_str()).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!("lookup in {} failed for {}: {}", partition.name(), request.url, e);
            None
        }
    }
}

/// Request headers that make a response specific to one caller.
const UNSHAREABLE_REQUEST_HEADERS: &[&str] = &["range", "authorization"];

/// Whether a live response to `request` may go into a shared partition.
pub(crate) fn is_shareable(request: &InterceptedRequest, live: &ResponseRecord) -> bool {
    live.is_storable() && UNSHAREABLE_REQUEST_HEADERS.iter().all(|h| request.header(h).is_none())
}

/// Store a live response if it may be shared.
///
/// The partition keeps its own copy of the body; the caller's record stays
/// fully readable.
async fn store(partition: &Partition, request: &InterceptedRequest, live: &ResponseRecord) {
    if !is_shareable(request, live) {
        tracing::debug!("not storing {} in {}: status {}", request.url, partition.name(), live.status);
        return;
    }
    if let Err(e) = partition.put(&request.method, request.url.as_str(), live).await {
        tracing::warn!("store in {} failed for {}: {}", partition.name(), request.url, e);
    }
}
