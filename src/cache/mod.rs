//! Cache Module
//!
//! Provides a bounded in-memory cache with TTL expiration and LRU eviction.

mod engine;
mod lru;
mod node;
mod stats;
mod store;
mod sync;


// Re-export public types
pub use engine::LruTtlCache;
pub use stats::CacheStats;
