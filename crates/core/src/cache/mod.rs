//! SQLite-backed partition store for cached responses.
//!
//! This module provides named, durable cache partitions using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request keys hashed with SHA-256 over method and canonical URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Lazy expiry: freshness is only evaluated when an entry is read

pub mod connection;
pub mod freshness;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod record;

pub use crate::Error;

pub use connection::CacheDb;
pub use freshness::{captured_at, is_fresh};
pub use partitions::Partition;
pub use record::ResponseRecord;
