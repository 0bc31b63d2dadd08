//! tour-proxy - caching edge proxy and resilient client for the TourAPI
//!
//! The proxy hides the upstream credential and caches upstream responses;
//! the client reaches the proxy with bounded retries and keeps its own
//! short-lived cache.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod proxy;
pub mod redact;

pub use cache::{create_cache, Cache, CacheConfig, CacheResult};
pub use client::{ApiClient, ApiError, Endpoint, Locale, QueryParams, ResponseEnvelope};
pub use config::{AppConfig, ClientConfig, ProxyConfig};
pub use error::{Result, TourError};
pub use fetch::{ResilientFetcher, RetryPolicy};
pub use output::OutputEnvelope;

/// tour-proxy version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
