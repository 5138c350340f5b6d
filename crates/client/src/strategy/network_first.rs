use lantern_core::Partition;
use url::Url;

use super::{StrategyContext, lookup, store};
use crate::request::InterceptedRequest;
use crate::response::ProxyResponse;

/// Network-first (documents).
///
/// Fallback chain on a network failure:
/// 1. this exact request in `partition`
/// 2. the root document, in `partition` and then in each of `root_fallbacks`
/// 3. the synthetic 404
pub async fn network_first(
    ctx: &StrategyContext<'_>, partition: &Partition, root_fallbacks: &[&Partition], root: &Url,
    request: &InterceptedRequest,
) -> ProxyResponse {
    let err = match ctx.fetcher.fetch(request).await {
        Ok(live) => {
            store(partition, request, &live).await;
            return ProxyResponse::network(live);
        }
        Err(e) => e,
    };

    if let Some(record) = lookup(partition, request).await {
        tracing::warn!("offline, serving cached {}: {}", request.url, err);
        return ProxyResponse::cached(record);
    }

    let root_request = InterceptedRequest::navigate(root.clone());
    for candidate in std::iter::once(partition).chain(root_fallbacks.iter().copied()) {
        if let Some(record) = lookup(candidate, &root_request).await {
            tracing::warn!("offline, serving cached {} in place of {}: {}", root, request.url, err);
            return ProxyResponse::cached(record);
        }
    }

    tracing::warn!("offline with no cached document for {}: {}", request.url, err);
    ProxyResponse::not_available(request.url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseSource;
    use crate::testing::StubFetcher;
    use lantern_core::{CacheDb, ResponseRecord};

    const ROOT: &str = "https://gracechurch.example/";
    const ABOUT: &str = "https://gracechurch.example/about";

    struct Fixture {
        dynamic: Partition,
        statics: Partition,
        fetcher: StubFetcher,
    }

    async fn fixture() -> Fixture {
        let db = CacheDb::open_in_memory().await.unwrap();
        Fixture {
            dynamic: db.open_partition("grace-dynamic-v1").await.unwrap(),
            statics: db.open_partition("grace-static-v1").await.unwrap(),
            fetcher: StubFetcher::new(),
        }
    }

    fn about() -> InterceptedRequest {
        InterceptedRequest::navigate(Url::parse(ABOUT).unwrap())
    }

    fn page(url: &str, body: &str) -> ResponseRecord {
        ResponseRecord::new(url, 200, vec![("content-type".into(), "text/html".into())], body.to_string())
    }

    async fn run(f: &Fixture) -> ProxyResponse {
        let ctx = StrategyContext::new(&f.fetcher);
        network_first(&ctx, &f.dynamic, &[&f.statics], &Url::parse(ROOT).unwrap(), &about()).await
    }

    #[tokio::test]
    async fn test_online_fetches_and_stores() {
        let f = fixture().await;
        f.fetcher.respond(ABOUT, 200, "<h1>About</h1>");
        f.dynamic.put("GET", ABOUT, &page(ABOUT, "old about")).await.unwrap();

        let response = run(&f).await;

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(&response.record.body[..], b"<h1>About</h1>");
        let stored = f.dynamic.get("GET", ABOUT).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"<h1>About</h1>");
    }

    #[tokio::test]
    async fn test_offline_serves_cached_page() {
        let f = fixture().await;
        f.fetcher.fail(ABOUT);
        f.dynamic.put("GET", ABOUT, &page(ABOUT, "cached about")).await.unwrap();

        let response = run(&f).await;

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(&response.record.body[..], b"cached about");
    }

    #[tokio::test]
    async fn test_offline_falls_back_to_root() {
        let f = fixture().await;
        f.fetcher.fail(ABOUT);
        f.statics.put("GET", ROOT, &page(ROOT, "home shell")).await.unwrap();

        let response = run(&f).await;

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(&response.record.body[..], b"home shell");
    }

    #[tokio::test]
    async fn test_root_in_dynamic_preferred() {
        let f = fixture().await;
        f.fetcher.fail(ABOUT);
        f.statics.put("GET", ROOT, &page(ROOT, "installed home")).await.unwrap();
        f.dynamic.put("GET", ROOT, &page(ROOT, "visited home")).await.unwrap();

        let response = run(&f).await;

        assert_eq!(&response.record.body[..], b"visited home");
    }

    #[tokio::test]
    async fn test_offline_with_nothing_cached_is_synthetic() {
        let f = fixture().await;
        f.fetcher.fail(ABOUT);

        let response = run(&f).await;

        assert!(response.is_synthetic());
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_error_status_not_stored() {
        let f = fixture().await;
        f.fetcher.respond(ABOUT, 500, "server error");
        f.dynamic.put("GET", ABOUT, &page(ABOUT, "good about")).await.unwrap();

        let response = run(&f).await;

        assert_eq!(response.status(), 500);
        let stored = f.dynamic.get("GET", ABOUT).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"good about");
    }
}
