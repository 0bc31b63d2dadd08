//! In-memory cache storage

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::stats::CacheStats;
use super::{Cache, CacheResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Cache entry containing the payload and its expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached response payload
    pub value: Value,

    /// When the entry was stored
    pub stored_at: Instant,

    /// When the entry stops being served; `None` when the TTL runs past
    /// what `Instant` can represent
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    pub fn new(value: Value, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    /// An entry is live up to and including its expiry instant
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

/// Process-local cache backed by a `HashMap`
///
/// Critical sections are short and synchronous; the lock is never held
/// across an await point.
pub struct MemoryCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    stats: RwLock<CacheStats>,
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.hits += 1;
        stats.calculate_hit_rate();
    }

    fn record_miss(&self) {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.misses += 1;
        stats.calculate_hit_rate();
    }

    /// Make room for one new key when a capacity is configured
    fn make_room(&self, entries: &mut HashMap<String, CacheEntry>, now: Instant) {
        let max = self.config.max_entries;
        if max == 0 || entries.len() < max {
            return;
        }

        entries.retain(|_, entry| !entry.is_expired(now));

        let mut evicted = 0;
        while entries.len() >= max {
            let oldest = entries
                .iter()
                // Entries that never expire go last
                .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    debug!("Evicted cache entry: {}", key);
                    evicted += 1;
                }
                None => break,
            }
        }

        if evicted > 0 {
            let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
            stats.evictions += evicted;
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult {
        if !self.config.enabled {
            debug!("Cache is disabled, bypassing");
            return CacheResult::Bypassed;
        }

        let now = self.clock.now();
        // Some(None) marks an entry that exists but has expired.
        let lookup = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries
                .get(key)
                .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()))
        };

        match lookup {
            Some(Some(value)) => {
                debug!("Cache hit: {}", key);
                self.record_hit();
                return CacheResult::Hit(value);
            }
            Some(None) => {
                let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                // Another writer may have refreshed the key in between.
                if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
                    entries.remove(key);
                    debug!("Cache entry expired: {}", key);
                }
            }
            None => debug!("Cache miss: {}", key),
        }

        self.record_miss();
        CacheResult::Miss
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        if !self.config.enabled {
            return;
        }

        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(key) {
            self.make_room(&mut entries, now);
        }
        entries.insert(key.to_string(), CacheEntry::new(value, now, ttl));
        debug!("Cached response for: {}", key);
    }

    fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            info!("Invalidated cache for: {}", key);
        }
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.stats.write().unwrap_or_else(PoisonError::into_inner) = CacheStats::new();
        info!("Cleared all cache entries");
    }

    fn stats(&self) -> CacheStats {
        let mut stats = self
            .stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        stats.entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        stats
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn ttl(&self) -> Duration {
        self.config.ttl_duration()
    }
}
