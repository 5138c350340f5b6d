//! Client side of lantern: the offline asset-caching proxy.
//!
//! This crate provides the live fetch pipeline, request classification,
//! the per-class strategy handlers, and the [`CachingProxy`] that owns the
//! install/activate/intercept lifecycle.

pub mod classify;
pub mod fetch;
pub mod proxy;
pub mod request;
pub mod response;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use classify::Classifier;
pub use fetch::{FetchClient, FetchConfig, Fetcher};
pub use proxy::{ActivateReport, CachingProxy, InstallReport, Lifecycle};
pub use request::{Destination, InterceptedRequest, RequestMode};
pub use response::{NOT_AVAILABLE_BODY, ProxyResponse, ResponseSource};
