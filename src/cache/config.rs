//! Cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled
    pub enabled: bool,

    /// Time-to-live for cache entries in seconds
    pub ttl: u64,

    /// Maximum number of live entries (0 = unlimited)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::proxy_default()
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom settings
    pub fn new(enabled: bool, ttl: u64, max_entries: usize) -> Self {
        Self {
            enabled,
            ttl,
            max_entries,
        }
    }

    /// Defaults for the edge proxy cache
    pub fn proxy_default() -> Self {
        Self::new(true, super::PROXY_CACHE_TTL, 0)
    }

    /// Defaults for the in-process client cache
    pub fn client_default() -> Self {
        Self::new(true, super::CLIENT_CACHE_TTL, 0)
    }

    pub fn ttl_duration(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    /// Apply runtime overrides on top of this configuration
    pub fn with_options(mut self, options: CacheOptions) -> Self {
        if let Some(enabled) = options.enabled {
            self.enabled = enabled;
        }

        if let Some(ttl) = options.ttl {
            self.ttl = ttl;
        }

        if let Some(max_entries) = options.max_entries {
            self.max_entries = max_entries;
        }

        self
    }
}

/// Runtime cache options that can override configuration
///
/// These are typically set via CLI flags like --no-cache or --cache-ttl.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Override the enabled setting
    pub enabled: Option<bool>,

    /// Override the TTL setting
    pub ttl: Option<u64>,

    /// Override the max_entries setting
    pub max_entries: Option<usize>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}
