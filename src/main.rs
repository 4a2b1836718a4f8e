//! LRU TTL Cache - workload driver
//!
//! Runs a synthetic read-through workload against the cache and reports
//! its statistics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_ttl_cache::{spawn_cleanup_task, CacheConfig, LruTtlCache, StatsReport, WorkloadConfig};

/// Lookups between inline cleanups when no background task may run.
const INLINE_CLEANUP_EVERY: usize = 1_000;

type Cache = LruTtlCache<u64, String>;

/// Main entry point for the workload driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache and workload configuration from environment variables
/// 3. Create the cache
/// 4. Start background TTL cleanup task (shared mode only)
/// 5. Run the workload until it completes or a shutdown signal arrives
/// 6. Log the final statistics report
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().context("loading cache configuration")?;
    let workload = WorkloadConfig::from_env().context("loading workload configuration")?;
    info!(
        "Configuration loaded: capacity={}, thread_safe={}, cleanup_interval={}ms, workers={}, operations={}, key_space={}, entry_ttl={}ms",
        config.capacity,
        config.thread_safe,
        config.cleanup_interval_ms,
        workload.workers,
        workload.operations_per_worker,
        workload.key_space,
        workload.entry_ttl_ms
    );

    let cache: Arc<Cache> = Arc::new(LruTtlCache::from_config(&config)?);

    // A cache without thread safety must never be touched by two callers at
    // once, so it gets one worker and no background task.
    let cleanup_handle = if cache.is_thread_safe() {
        info!("Background cleanup task started");
        Some(spawn_cleanup_task(cache.clone(), config.cleanup_interval()))
    } else {
        warn!("Cache is not thread safe: running a single worker with inline cleanup");
        None
    };

    let stop = Arc::new(AtomicBool::new(false));
    let workers = spawn_workers(cache.clone(), &workload, stop.clone());

    // A signal only raises the stop flag, the workers are joined either way
    let signal_watch = {
        let stop = stop.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            stop.store(true, Ordering::Relaxed);
        })
    };

    join_workers(workers).await?;
    signal_watch.abort();
    if stop.load(Ordering::Relaxed) {
        info!("Workload stopped early, all workers joined");
    } else {
        info!("Workload complete");
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }

    let report = StatsReport::capture(&cache);
    info!("Final statistics: {}", serde_json::to_string(&report)?);
    Ok(())
}

/// Spawns the workers on blocking threads.
///
/// An unsynchronized cache gets a single worker that also purges expired
/// entries inline.
fn spawn_workers(
    cache: Arc<Cache>,
    workload: &WorkloadConfig,
    stop: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    let (workers, inline_cleanup) = if cache.is_thread_safe() {
        (workload.workers, false)
    } else {
        (1, true)
    };

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let cache = cache.clone();
        let workload = workload.clone();
        let stop = stop.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            run_worker(&cache, &workload, worker, inline_cleanup, &stop)
        }));
    }

    handles
}

/// Waits for every worker, even after one of them panicked.
async fn join_workers(handles: Vec<JoinHandle<()>>) -> anyhow::Result<()> {
    let mut outcome = Ok(());
    for handle in handles {
        let joined = handle.await;
        if outcome.is_ok() {
            outcome = joined;
        }
    }
    outcome.context("worker panicked")
}

/// Performs the read-through lookups of one worker.
fn run_worker(
    cache: &Cache,
    workload: &WorkloadConfig,
    worker: usize,
    inline_cleanup: bool,
    stop: &AtomicBool,
) {
    let ttl = workload.entry_ttl();
    let mut loads = 0u64;

    for op in 0..workload.operations_per_worker {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if inline_cleanup && op > 0 && op % INLINE_CLEANUP_EVERY == 0 {
            cache.cleanup_expired();
        }

        let key = workload_key(worker, op, workload.key_space);
        cache.get_or_load(
            key,
            |key| {
                loads += 1;
                backing_store_lookup(*key)
            },
            ttl,
        );
    }

    debug!(worker, loads, "Worker finished");
}

/// Picks a key skewed towards the low end of the key space.
fn workload_key(worker: usize, op: usize, key_space: u64) -> u64 {
    let mut x = (worker as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (op as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 31;
    let r = u128::from(x % key_space);
    // Squaring favors low keys, so some keys are hot and some cold
    (r * r / u128::from(key_space)) as u64
}

/// Simulated backing store: every 13th key has no value.
fn backing_store_lookup(key: u64) -> Option<String> {
    (key % 13 != 0).then(|| format!("value-{key}"))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping workload...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping workload...");
        }
    }
}
