use std::time::Duration;

use lantern_core::{Partition, is_fresh};

use super::{StrategyContext, lookup, store};
use crate::request::InterceptedRequest;
use crate::response::ProxyResponse;

/// Cache-first with a freshness gate (images).
///
/// A cached record younger than `max_age` is served as-is. Anything else
/// goes to the network; on a network failure the stale record is still
/// better than nothing.
pub async fn cache_first_with_freshness(
    ctx: &StrategyContext<'_>, partition: &Partition, request: &InterceptedRequest, max_age: Duration,
) -> ProxyResponse {
    let cached = lookup(partition, request).await;

    if let Some(record) = &cached
        && is_fresh(record, max_age, ctx.now)
    {
        tracing::debug!("fresh hit in {} for {}", partition.name(), request.url);
        return ProxyResponse::cached(record.clone());
    }

    match ctx.fetcher.fetch(request).await {
        Ok(live) => {
            store(partition, request, &live).await;
            ProxyResponse::network(live)
        }
        Err(e) => match cached {
            Some(stale) => {
                tracing::warn!("serving stale {} after fetch failure: {}", request.url, e);
                ProxyResponse::cached(stale)
            }
            None => {
                tracing::warn!("no cached copy of {} after fetch failure: {}", request.url, e);
                ProxyResponse::not_available(request.url.as_str())
            }
        },
    }
}

/// Cache-first without expiry (static assets and fonts).
///
/// Any cached record is served. On a miss the response is fetched and
/// stored. With `recheck_on_failure`, a failed fetch looks at the partition
/// once more in case a concurrent request stored the resource meanwhile.
pub async fn cache_first(
    ctx: &StrategyContext<'_>, partition: &Partition, request: &InterceptedRequest, recheck_on_failure: bool,
) -> ProxyResponse {
    if let Some(record) = lookup(partition, request).await {
        tracing::debug!("hit in {} for {}", partition.name(), request.url);
        return ProxyResponse::cached(record);
    }

    match ctx.fetcher.fetch(request).await {
        Ok(live) => {
            store(partition, request, &live).await;
            ProxyResponse::network(live)
        }
        Err(e) => {
            tracing::warn!("cache-first fetch failed for {}: {}", request.url, e);
            if recheck_on_failure && let Some(record) = lookup(partition, request).await {
                return ProxyResponse::cached(record);
            }
            ProxyResponse::not_available(request.url.as_str())
        }
    }
}
