//! Core types and shared functionality for lantern.
//!
//! This crate provides:
//! - Partition store with SQLite backend
//! - Response records and the freshness evaluator
//! - Resource-class policy table and partition naming
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod policy;

pub use cache::{CacheDb, Partition, ResponseRecord, is_fresh};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use policy::{PartitionKind, PartitionNames, ResourceClass, Strategy};
