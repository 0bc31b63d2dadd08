//! Edge proxy
//!
//! An axum service that fronts the upstream TourAPI: it accepts only GET
//! (plus CORS preflight), injects the server-side credential, answers from
//! its cache when it can, and otherwise fetches upstream with bounded
//! retries. Cache writes run on a task tracker so they never delay the
//! response.

mod cors;
mod handler;

pub use cors::{cors_headers, preflight_headers, request_origin};
pub use handler::{handle_request, upstream_url, X_CACHE};

use crate::cache::{create_cache, Cache};
use crate::config::ProxyConfig;
use crate::error::Result;
use crate::fetch::ResilientFetcher;
use crate::redact::mask_secret;
use axum::Router;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Shared state of a running proxy
pub struct ProxyState {
    config: ProxyConfig,
    cache: Arc<dyn Cache>,
    fetcher: ResilientFetcher,
    cache_writes: TaskTracker,
}

impl ProxyState {
    /// State with its own cache and a `reqwest` upstream transport
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let fetcher = ResilientFetcher::with_reqwest(config.retry_policy())?;
        let cache = create_cache(config.cache.clone());
        Ok(Self::with_parts(config, cache, fetcher))
    }

    /// State over an injected cache and fetcher
    ///
    /// The fetcher is told the configured credential so its logs scrub it.
    pub fn with_parts(config: ProxyConfig, cache: Arc<dyn Cache>, fetcher: ResilientFetcher) -> Self {
        let fetcher = fetcher.with_secret(config.service_key());
        Self {
            config,
            cache,
            fetcher,
            cache_writes: TaskTracker::new(),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    fn store_in_background(&self, key: String, value: Value) {
        let cache = Arc::clone(&self.cache);
        self.cache_writes.spawn(async move {
            cache.put(&key, value);
        });
    }

    /// Wait until every cache write spawned so far has landed
    pub async fn flush_cache_writes(&self) {
        self.cache_writes.close();
        self.cache_writes.wait().await;
        self.cache_writes.reopen();
    }

    /// Flush pending writes, report, and drop every cached entry
    pub async fn teardown(&self) {
        self.flush_cache_writes().await;
        info!("{}", self.cache.stats().display());
        self.cache.clear();
    }
}

/// Router that sends every path and method through the proxy state machine
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new().fallback(handle_request).with_state(state)
}

/// Serve on `listener` until `shutdown` resolves, then tear the state down
pub async fn serve_on<F>(listener: TcpListener, state: Arc<ProxyState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Proxy shutting down");
    state.teardown().await;
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: ProxyConfig) -> Result<()> {
    match config.service_key() {
        Some(key) => info!("Upstream credential loaded ({})", mask_secret(key)),
        None => warn!("No upstream credential configured; GET requests will fail with 500"),
    }

    let listener = TcpListener::bind(&config.bind).await?;
    let state = Arc::new(ProxyState::new(config)?);
    serve_on(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await
}
