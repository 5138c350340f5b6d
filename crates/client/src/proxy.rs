//! The caching proxy: lifecycle owner and request dispatcher.
//!
//! ### Lifecycle
//! `Idle → Installing → Installed → Activating → Active`
//!
//! - **install** pre-populates the static partition from the manifest,
//!   best-effort, and asks to be activated immediately.
//! - **activate** deletes every partition not named for the current
//!   version, then claims control of clients.
//! - **intercept** classifies a request and hands it to its strategy. Until
//!   the proxy is active, requests fail open to the live network.
//!
//! Background sync and push notifications are acknowledged extension
//! points only; neither touches a partition.

use std::sync::Arc;

use lantern_core::{AppConfig, CacheDb, ConfigError, Error, Partition, PartitionKind, PartitionNames, Strategy};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::classify::Classifier;
use crate::fetch::Fetcher;
use crate::request::{Destination, InterceptedRequest};
use crate::response::ProxyResponse;
use crate::strategy::{self, StrategyContext};

/// Where the proxy is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Idle,
    Installing,
    Installed,
    Activating,
    Active,
}

/// Outcome of [`CachingProxy::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Manifest URLs now in the static partition, in manifest order.
    pub stored: Vec<String>,
    /// Manifest URLs that could not be stored, with the reason.
    pub failed: Vec<(String, String)>,
    /// Activate right away instead of waiting for older instances.
    pub skip_waiting: bool,
}

/// Outcome of [`CachingProxy::activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    /// Partitions removed because they belong to another version.
    pub deleted: Vec<String>,
    /// Whether open clients are now served by this instance.
    pub claimed: bool,
}

/// Offline asset-caching proxy for one deployment.
pub struct CachingProxy {
    db: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    classifier: Classifier,
    names: PartitionNames,
    root: Url,
    manifest: Vec<Url>,
    state: RwLock<Lifecycle>,
}

impl CachingProxy {
    pub fn new(
        db: CacheDb, fetcher: Arc<dyn Fetcher>, classifier: Classifier, names: PartitionNames, origin: &Url,
        manifest: Vec<Url>,
    ) -> Self {
        Self {
            db,
            fetcher,
            classifier,
            names,
            root: origin.join("/").unwrap_or_else(|_| origin.clone()),
            manifest,
            state: RwLock::new(Lifecycle::Idle),
        }
    }

    /// Build a proxy from loaded configuration.
    pub fn from_config(config: &AppConfig, db: CacheDb, fetcher: Arc<dyn Fetcher>) -> Result<Self, ConfigError> {
        Ok(Self::new(
            db,
            fetcher,
            Classifier::from_config(config)?,
            config.partition_names(),
            &config.origin_url()?,
            config.precache_urls()?,
        ))
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        *self.state.read().await
    }

    pub fn names(&self) -> &PartitionNames {
        &self.names
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The root document URL used as the last document fallback.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Open one of the current partitions.
    pub async fn partition(&self, kind: PartitionKind) -> Result<Partition, Error> {
        self.db.open_partition(self.names.get(kind)).await
    }

    /// Pre-populate the static partition from the install manifest.
    ///
    /// Each entry is fetched and stored on its own; a failing entry is
    /// logged and skipped. Only a store that cannot open its partitions
    /// fails the install as a whole.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        *self.state.write().await = Lifecycle::Installing;
        tracing::info!("installing {} precache entries", self.manifest.len());

        let result = self.precache().await;

        match &result {
            Ok(report) => {
                *self.state.write().await = Lifecycle::Installed;
                tracing::info!("install finished: {} stored, {} failed", report.stored.len(), report.failed.len());
            }
            Err(e) => {
                *self.state.write().await = Lifecycle::Idle;
                tracing::error!("install aborted: {}", e);
            }
        }

        result
    }

    async fn precache(&self) -> Result<InstallReport, Error> {
        for kind in PartitionKind::ALL {
            self.partition(kind).await?;
        }
        let statics = self.partition(PartitionKind::Static).await?;

        let mut report = InstallReport { skip_waiting: true, ..Default::default() };
        for url in &self.manifest {
            let request = InterceptedRequest::get(url.clone()).with_destination(Destination::Other);
            let outcome = match self.fetcher.fetch(&request).await {
                Ok(live) if strategy::is_shareable(&request, &live) => {
                    statics.put(&request.method, url.as_str(), &live).await
                }
                Ok(live) => Err(Error::Network(format!("status {} is not storable", live.status))),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => report.stored.push(url.to_string()),
                Err(e) => {
                    tracing::warn!("precache of {} failed, continuing: {}", url, e);
                    report.failed.push((url.to_string(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Sweep partitions from other versions and claim clients.
    ///
    /// Enumeration and deletion errors are logged; they never stop the
    /// proxy from claiming.
    pub async fn activate(&self) -> ActivateReport {
        *self.state.write().await = Lifecycle::Activating;

        let mut report = ActivateReport::default();
        match self.db.partition_names().await {
            Ok(existing) => {
                for name in existing.into_iter().filter(|n| !self.names.is_current(n)) {
                    match self.db.delete_partition(&name).await {
                        Ok(_) => {
                            tracing::info!("deleted stale partition {}", name);
                            report.deleted.push(name);
                        }
                        Err(e) => tracing::warn!("could not delete stale partition {}: {}", name, e),
                    }
                }
            }
            Err(e) => tracing::warn!("could not enumerate partitions: {}", e),
        }

        *self.state.write().await = Lifecycle::Active;
        report.claimed = true;
        tracing::info!("activated, serving with {:?}", self.names.all());
        report
    }

    /// Serve one intercepted request. Never fails.
    pub async fn intercept(&self, request: InterceptedRequest) -> ProxyResponse {
        let ctx = StrategyContext::new(self.fetcher.as_ref());

        if self.lifecycle().await != Lifecycle::Active {
            tracing::debug!("not active yet, passing {} through", request.url);
            return strategy::network_only(&ctx, &request).await;
        }

        if !request.is_get() {
            return strategy::network_only(&ctx, &request).await;
        }

        let class = self.classifier.classify(&request);
        let policy = class.policy();
        tracing::debug!("{} {} classified as {}", request.method, request.url, class);

        let Some(kind) = policy.partition else {
            return strategy::network_only(&ctx, &request).await;
        };

        let partition = match self.partition(kind).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("partition {} unavailable, passing {} through: {}", kind, request.url, e);
                return strategy::network_only(&ctx, &request).await;
            }
        };

        match policy.strategy {
            Strategy::CacheFirstWithFreshness { max_age } => {
                strategy::cache_first_with_freshness(&ctx, &partition, &request, max_age).await
            }
            Strategy::CacheFirst { recheck_on_failure } => {
                strategy::cache_first(&ctx, &partition, &request, recheck_on_failure).await
            }
            Strategy::NetworkFirst => {
                let statics = self.partition(PartitionKind::Static).await.ok();
                let fallbacks: Vec<&Partition> = statics.iter().collect();
                strategy::network_first(&ctx, &partition, &fallbacks, &self.root, &request).await
            }
            Strategy::NetworkOnly => strategy::network_only(&ctx, &request).await,
        }
    }

    /// Deferred background-sync hook. Acknowledged, nothing to do.
    pub async fn on_sync(&self, tag: &str) {
        tracing::debug!("background sync '{}' acknowledged", tag);
    }

    /// Push-message hook. Acknowledged, nothing to do.
    pub async fn on_push(&self, payload: &[u8]) {
        tracing::debug!("push message of {} bytes acknowledged", payload.len());
    }
}
