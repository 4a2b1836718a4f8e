//! Configuration Module
//!
//! Handles loading cache and workload settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Guard every cache operation with a reader/writer lock
    pub thread_safe: bool,
    /// Background cleanup task interval in milliseconds
    pub cleanup_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_THREAD_SAFE` - Shared mode on/off (default: true)
    /// - `CLEANUP_INTERVAL_MS` - Cleanup frequency in milliseconds (default: 1000)
    ///
    /// # Errors
    /// `CacheError::InvalidConfiguration` when a variable is set but cannot be
    /// parsed, or when the resulting config fails [`CacheConfig::validate`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity)?,
            thread_safe: env_flag_or("CACHE_THREAD_SAFE", defaults.thread_safe)?,
            cleanup_interval_ms: env_or("CLEANUP_INTERVAL_MS", defaults.cleanup_interval_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every setting is in range.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be a positive integer".to_string(),
            ));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(CacheError::InvalidConfiguration(
                "cleanup interval must be a positive number of milliseconds".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the cleanup interval as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            thread_safe: true,
            cleanup_interval_ms: 1000,
        }
    }
}

/// Synthetic workload run by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    /// Number of concurrent workers
    pub workers: usize,
    /// Lookups performed by each worker
    pub operations_per_worker: usize,
    /// Number of distinct keys the workers draw from
    pub key_space: u64,
    /// TTL of loaded entries in milliseconds, 0 = never expire
    pub entry_ttl_ms: u64,
}

impl WorkloadConfig {
    /// Loads the workload from environment variables.
    ///
    /// # Environment Variables
    /// - `WORKERS` - Concurrent workers (default: 4)
    /// - `OPERATIONS` - Lookups per worker (default: 10000)
    /// - `KEY_SPACE` - Distinct keys (default: 2000)
    /// - `ENTRY_TTL_MS` - TTL of loaded entries, 0 disables expiry (default: 250)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            workers: env_or("WORKERS", defaults.workers)?,
            operations_per_worker: env_or("OPERATIONS", defaults.operations_per_worker)?,
            key_space: env_or("KEY_SPACE", defaults.key_space)?,
            entry_ttl_ms: env_or("ENTRY_TTL_MS", defaults.entry_ttl_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every setting is in range.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(CacheError::InvalidConfiguration(
                "workers must be a positive integer".to_string(),
            ));
        }
        if self.key_space == 0 {
            return Err(CacheError::InvalidConfiguration(
                "key space must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the entry TTL, None when entries never expire.
    pub fn entry_ttl(&self) -> Option<Duration> {
        (self.entry_ttl_ms > 0).then(|| Duration::from_millis(self.entry_ttl_ms))
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            operations_per_worker: 10_000,
            key_space: 2_000,
            entry_ttl_ms: 250,
        }
    }
}

// == Environment Helpers ==
/// Reads and parses `name`, falling back to `default` when it is unset.
fn env_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            CacheError::InvalidConfiguration(format!("{name} has invalid value '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

/// Reads a boolean flag, accepting the usual spellings.
fn env_flag_or(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => parse_flag(&raw).ok_or_else(|| {
            CacheError::InvalidConfiguration(format!("{name} has invalid value '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
