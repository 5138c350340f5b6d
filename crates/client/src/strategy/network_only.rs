use super::StrategyContext;
use crate::request::InterceptedRequest;
use crate::response::ProxyResponse;

/// Live fetch returned verbatim. Never reads or writes a partition.
pub async fn network_only(ctx: &StrategyContext<'_>, request: &InterceptedRequest) -> ProxyResponse {
    match ctx.fetcher.fetch(request).await {
        Ok(live) => ProxyResponse::passthrough(live),
        Err(e) => {
            tracing::warn!("network-only fetch failed for {}: {}", request.url, e);
            ProxyResponse::not_available(request.url.as_str())
        }
    }
}
