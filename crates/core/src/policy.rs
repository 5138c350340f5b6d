//! Resource-class policy table and versioned partition naming.
//!
//! Every intercepted request falls into exactly one [`ResourceClass`], and
//! each class carries a fixed (strategy, partition, max-age) triple:
//!
//! | class        | strategy                  | partition | max-age   |
//! |--------------|---------------------------|-----------|-----------|
//! | image        | cache-first + freshness   | images    | 14 days   |
//! | document     | network-first             | dynamic   | 7 days    |
//! | static-asset | cache-first               | static    | 30 days   |
//! | font         | cache-first               | static    | unbounded |
//! | external     | network-only              | -         | n/a       |
//!
//! Only the image max-age is consulted at runtime. The document and static
//! values are carried for reference and reporting.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Image max-age (14 days).
pub const IMAGE_MAX_AGE: Duration = Duration::from_secs(14 * DAY.as_secs());

/// Document soft max-age (7 days). Network-first never gates on it.
pub const DYNAMIC_MAX_AGE: Duration = Duration::from_secs(7 * DAY.as_secs());

/// Static-asset max-age (30 days). Cache-first-simple never gates on it.
pub const STATIC_MAX_AGE: Duration = Duration::from_secs(30 * DAY.as_secs());

/// The bucket an intercepted request is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceClass {
    Image,
    Document,
    StaticAsset,
    Font,
    External,
}

/// Fetch policy implemented by one strategy handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve a cached record while it is younger than `max_age`.
    CacheFirstWithFreshness { max_age: Duration },
    /// Always try the network; fall back to the cache, then to the root document.
    NetworkFirst,
    /// Serve any cached record; fetch and store only on a miss.
    CacheFirst { recheck_on_failure: bool },
    /// Live network only, nothing stored.
    NetworkOnly,
}

/// One of the three durable partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    Static,
    Dynamic,
    Images,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [PartitionKind::Static, PartitionKind::Dynamic, PartitionKind::Images];

    pub fn as_str(self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Images => "images",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full policy for a resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub strategy: Strategy,
    pub partition: Option<PartitionKind>,
    /// `None` means unbounded or not applicable.
    pub max_age: Option<Duration>,
}

impl ResourceClass {
    pub fn policy(self) -> Policy {
        match self {
            ResourceClass::Image => Policy {
                strategy: Strategy::CacheFirstWithFreshness { max_age: IMAGE_MAX_AGE },
                partition: Some(PartitionKind::Images),
                max_age: Some(IMAGE_MAX_AGE),
            },
            ResourceClass::Document => Policy {
                strategy: Strategy::NetworkFirst,
                partition: Some(PartitionKind::Dynamic),
                max_age: Some(DYNAMIC_MAX_AGE),
            },
            ResourceClass::StaticAsset => Policy {
                strategy: Strategy::CacheFirst { recheck_on_failure: false },
                partition: Some(PartitionKind::Static),
                max_age: Some(STATIC_MAX_AGE),
            },
            ResourceClass::Font => Policy {
                strategy: Strategy::CacheFirst { recheck_on_failure: true },
                partition: Some(PartitionKind::Static),
                max_age: None,
            },
            ResourceClass::External => Policy { strategy: Strategy::NetworkOnly, partition: None, max_age: None },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceClass::Image => "image",
            ResourceClass::Document => "document",
            ResourceClass::StaticAsset => "static-asset",
            ResourceClass::Font => "font",
            ResourceClass::External => "external",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three version-tagged partition names for one deployment.
///
/// Names have the form `<app>-<kind>-v<version>`. Bumping the version
/// renames every partition, and activation sweeps the old names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    static_name: String,
    dynamic_name: String,
    images_name: String,
}

impl PartitionNames {
    pub fn new(app: &str, version: &str) -> Self {
        let name = |kind: PartitionKind| format!("{app}-{kind}-v{version}");
        Self {
            static_name: name(PartitionKind::Static),
            dynamic_name: name(PartitionKind::Dynamic),
            images_name: name(PartitionKind::Images),
        }
    }

    pub fn get(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_name,
            PartitionKind::Dynamic => &self.dynamic_name,
            PartitionKind::Images => &self.images_name,
        }
    }

    /// All current names, in `PartitionKind::ALL` order.
    pub fn all(&self) -> [&str; 3] {
        [&self.static_name, &self.dynamic_name, &self.images_name]
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}
