//! LRU TTL Cache - a bounded in-memory cache
//!
//! Provides least-recently-used eviction, per-entry TTL expiration and
//! lifetime hit/miss statistics, with an optional thread-safe mode.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{CacheStats, LruTtlCache};
pub use config::{CacheConfig, WorkloadConfig};
pub use error::{CacheError, Result};
pub use models::StatsReport;
pub use tasks::spawn_cleanup_task;
