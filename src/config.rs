//! Runtime configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables. The upstream credential is only ever read on the
//! proxy side.
//!
//! ```toml
//! [proxy]
//! bind = "0.0.0.0:8787"
//! upstream_base = "https://apis.data.go.kr/B551011"
//! timeout_ms = 10000
//! max_retries = 2
//!
//! [proxy.cache]
//! ttl = 600
//!
//! [client]
//! proxy_url = "http://127.0.0.1:8787"
//! mobile_app = "SoraMiro"
//!
//! [client.cache]
//! ttl = 300
//! ```

use crate::cache::CacheConfig;
use crate::error::{Result, TourError};
use crate::fetch::RetryPolicy;
use crate::redact::mask_secret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upstream TourAPI host
pub const DEFAULT_UPSTREAM_BASE: &str = "https://apis.data.go.kr/B551011";

/// Proxy the client talks to when nothing else is configured
pub const DEFAULT_PROXY_URL: &str = "https://tour-api-proxy.lsd9901.workers.dev";

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_MOBILE_APP: &str = "SoraMiro";
pub const DEFAULT_MOBILE_OS: &str = "WEB";

pub const ENV_CONFIG_PATH: &str = "TOUR_PROXY_CONFIG";
pub const ENV_SERVICE_KEY: &str = "TOUR_API_KEY";
pub const ENV_PROXY_URL: &str = "TOUR_WORKER_URL";
pub const ENV_UPSTREAM_URL: &str = "TOUR_UPSTREAM_URL";
pub const ENV_BIND: &str = "TOUR_PROXY_BIND";

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub proxy: ProxyConfig,
    pub client: ClientConfig,
}

/// Edge proxy settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen address
    pub bind: String,

    /// Upstream host prefix; the inbound path is appended to it
    pub upstream_base: String,

    /// Upstream credential, injected as `serviceKey`
    #[serde(skip_serializing)]
    pub service_key: Option<String>,

    /// Per-attempt upstream deadline in milliseconds
    pub timeout_ms: u64,

    /// Upstream retries after the first attempt
    pub max_retries: u32,

    /// Include a (redacted) `details` field in error bodies
    pub expose_error_details: bool,

    pub cache: CacheConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            upstream_base: DEFAULT_UPSTREAM_BASE.to_string(),
            service_key: None,
            timeout_ms: crate::fetch::DEFAULT_TIMEOUT.as_millis() as u64,
            max_retries: crate::fetch::DEFAULT_MAX_RETRIES,
            expose_error_details: false,
            cache: CacheConfig::proxy_default(),
        }
    }
}

impl ProxyConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.timeout_ms), self.max_retries)
    }

    /// The configured credential, treating an empty string as missing
    pub fn service_key(&self) -> Option<&str> {
        self.service_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("bind", &self.bind)
            .field("upstream_base", &self.upstream_base)
            .field("service_key", &self.service_key().map(mask_secret))
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("expose_error_details", &self.expose_error_details)
            .field("cache", &self.cache)
            .finish()
    }
}

/// API client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the edge proxy
    pub proxy_url: String,

    /// Default `MobileApp` parameter
    pub mobile_app: String,

    /// Default `MobileOS` parameter
    pub mobile_os: String,

    /// Per-attempt deadline in milliseconds
    pub timeout_ms: u64,

    /// Retries after the first attempt
    pub max_retries: u32,

    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            mobile_app: DEFAULT_MOBILE_APP.to_string(),
            mobile_os: DEFAULT_MOBILE_OS.to_string(),
            timeout_ms: crate::fetch::DEFAULT_TIMEOUT.as_millis() as u64,
            max_retries: crate::fetch::DEFAULT_MAX_RETRIES,
            cache: CacheConfig::client_default(),
        }
    }
}

impl ClientConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.timeout_ms), self.max_retries)
    }
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| TourError::Config(format!("Invalid config: {}", e)))
    }

    /// Read a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TourError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&contents)
    }

    /// Load configuration the way the binary does.
    ///
    /// An explicit path wins over `TOUR_PROXY_CONFIG`; with neither, defaults
    /// are used. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Some(key) = env_value(ENV_SERVICE_KEY) {
            self.proxy.service_key = Some(key);
        }
        if let Some(url) = env_value(ENV_UPSTREAM_URL) {
            self.proxy.upstream_base = url;
        }
        if let Some(bind) = env_value(ENV_BIND) {
            self.proxy.bind = bind;
        }
        if let Some(url) = env_value(ENV_PROXY_URL) {
            self.client.proxy_url = url;
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
