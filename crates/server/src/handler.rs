//! HTTP front end for the caching proxy.
//!
//! Every request outside `/_lantern/` is translated into an
//! [`InterceptedRequest`] and answered by [`CachingProxy::intercept`].
//! Origin-form targets (`/about`) resolve against the configured origin;
//! absolute-form targets (`https://fonts.googleapis.com/css2`) are used as
//! given, so the binary also works as a forward proxy.
//!
//! Every proxied response carries `x-lantern-cache: hit|miss|bypass|synthetic`.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lantern_client::fetch::{canonicalize, header_text, is_hop_by_hop};
use lantern_client::{CachingProxy, Destination, InterceptedRequest, ProxyResponse, RequestMode};
use serde_json::json;
use url::Url;

use crate::error::FrontError;

pub const CACHE_STATUS_HEADER: &str = "x-lantern-cache";

#[derive(Clone)]
pub struct AppState {
    proxy: Arc<CachingProxy>,
    origin: Url,
}

impl AppState {
    pub fn new(proxy: Arc<CachingProxy>, origin: Url) -> Self {
        Self { proxy, origin }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/_lantern/status", get(status))
        .route("/_lantern/sync/{tag}", post(sync))
        .route("/_lantern/push", post(push))
        .fallback(intercept)
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "lifecycle": state.proxy.lifecycle().await,
        "partitions": state.proxy.names().all(),
    }))
}

async fn sync(State(state): State<AppState>, Path(tag): Path<String>) -> StatusCode {
    state.proxy.on_sync(&tag).await;
    StatusCode::ACCEPTED
}

async fn push(State(state): State<AppState>, body: Bytes) -> StatusCode {
    state.proxy.on_push(&body).await;
    StatusCode::ACCEPTED
}

async fn intercept(
    State(state): State<AppState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes,
) -> Result<Response, FrontError> {
    let request = to_intercepted(&state.origin, &method, &uri, &headers, body)?;
    let response = state.proxy.intercept(request).await;
    tracing::info!(
        "{} {} -> {} ({})",
        method,
        uri,
        response.status(),
        response.source.as_str()
    );
    Ok(into_http(response))
}

/// Translate an incoming HTTP request into the proxy's request model.
fn to_intercepted(
    origin: &Url, method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes,
) -> Result<InterceptedRequest, FrontError> {
    let target = if uri.scheme().is_some() {
        uri.to_string()
    } else {
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/").to_string()
    };
    let url = canonicalize(&target, origin).map_err(|e| FrontError::InvalidTarget(format!("{target}: {e}")))?;

    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let destination = header_str("sec-fetch-dest").map(Destination::from_fetch_dest).unwrap_or_default();
    let mode = match header_str("sec-fetch-mode") {
        Some(mode) => RequestMode::from_fetch_mode(mode),
        None if *method == Method::GET && header_str("accept").is_some_and(|a| a.contains("text/html")) => {
            RequestMode::Navigate
        }
        None => RequestMode::default(),
    };

    let mut request = InterceptedRequest::new(method.as_str(), url)
        .with_destination(destination)
        .with_mode(mode)
        .with_body(body);
    for (name, value) in headers {
        if name.as_str() == header::HOST.as_str() || is_hop_by_hop(name.as_str()) {
            continue;
        }
        request = request.with_header(name.as_str(), &header_text(value));
    }

    Ok(request)
}

fn into_http(response: ProxyResponse) -> Response {
    let status = StatusCode::from_u16(response.record.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut http = (status, Body::from(response.record.body.clone())).into_response();

    let out = http.headers_mut();
    for (name, value) in &response.record.headers {
        if is_hop_by_hop(name) || name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            out.append(name, value);
        }
    }
    out.insert(CACHE_STATUS_HEADER, HeaderValue::from_static(response.source.as_str()));

    http
}
