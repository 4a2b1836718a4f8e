//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LruTtlCache;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// cleanup runs. Each run holds the cache for one `cleanup_expired` call.
///
/// # Arguments
/// * `cache` - Shared cache, must be built with `thread_safe = true`; an
///   unsynchronized cache panics as soon as the task and another caller
///   overlap
/// * `interval` - Time between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(LruTtlCache::<String, String>::new(1000, true)?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<K, V>(cache: Arc<LruTtlCache<K, V>>, interval: Duration) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    debug_assert!(
        cache.is_thread_safe(),
        "cleanup task needs a thread safe cache"
    );

    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting TTL cleanup task"
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();

            // Log cleanup statistics
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
