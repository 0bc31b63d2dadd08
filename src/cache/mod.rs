//! Response caching module
//!
//! Provides an in-memory, TTL-expiring key→JSON store. Two independent
//! instances exist at runtime: one inside the edge proxy (keyed by the
//! inbound URL) and one inside the API client (keyed by the normalized
//! request URL). Expired entries are treated as absent and removed lazily
//! on read.

mod clock;
mod config;
mod stats;
mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheOptions};
pub use stats::CacheStats;
pub use storage::{CacheEntry, MemoryCache};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Edge proxy cache TTL in seconds (10 minutes)
pub const PROXY_CACHE_TTL: u64 = 600;

/// Client-side cache TTL in seconds (5 minutes)
pub const CLIENT_CACHE_TTL: u64 = 300;

/// Cache result indicating whether the value was retrieved from cache
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// Value was found and has not expired
    Hit(Value),
    /// Value was not in cache or was expired
    Miss,
    /// Cache was bypassed (disabled by configuration)
    Bypassed,
}

impl CacheResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheResult::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, CacheResult::Miss)
    }

    pub fn is_bypassed(&self) -> bool {
        matches!(self, CacheResult::Bypassed)
    }

    /// The cached value, if any
    pub fn into_value(self) -> Option<Value> {
        match self {
            CacheResult::Hit(value) => Some(value),
            _ => None,
        }
    }
}

/// Cache interface shared by the proxy and the client
///
/// Implementations must never return an entry past its expiry. Writes
/// overwrite unconditionally (last write wins).
pub trait Cache: Send + Sync {
    /// Look up a value by key
    fn get(&self, key: &str) -> CacheResult;

    /// Store a value with an explicit TTL
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Store a value with the configured TTL
    fn put(&self, key: &str, value: Value) {
        self.set(key, value, self.ttl());
    }

    /// Remove a single entry
    fn invalidate(&self, key: &str);

    /// Remove every entry and reset counters
    fn clear(&self);

    /// Snapshot of cache statistics
    fn stats(&self) -> CacheStats;

    /// Check if caching is enabled
    fn is_enabled(&self) -> bool;

    /// Configured time-to-live for `put`
    fn ttl(&self) -> Duration;
}

/// Create a cache instance owned by the caller (the `init` half of the lifecycle).
///
/// The `teardown` half is [`Cache::clear`].
pub fn create_cache(config: CacheConfig) -> Arc<dyn Cache> {
    Arc::new(MemoryCache::new(config))
}

/// Create a cache that reads time from the given clock
pub fn create_cache_with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Arc<dyn Cache> {
    Arc::new(MemoryCache::with_clock(config, clock))
}
