//! Per-request state machine of the edge proxy
//!
//! OPTIONS → preflight; non-GET → 405; no credential → 500;
//! cache hit → 200; upstream success → store + 200; failure → 500.

use super::cors::{cors_headers, preflight_headers, request_origin};
use super::ProxyState;
use crate::cache::CacheResult;
use crate::error::{Result, TourError};
use crate::redact::redact_credential;
use axum::extract::State;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Header telling callers whether the edge cache answered
pub const X_CACHE: &str = "x-cache";

pub async fn handle_request(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, preflight_headers(&headers)).into_response();
    }

    let origin = request_origin(&headers);

    if method != Method::GET {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            origin,
            json!({ "error": "Method not allowed" }),
        );
    }

    let Some(service_key) = state.config.service_key() else {
        error!("Upstream credential is not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            origin,
            json!({ "error": "API key not configured" }),
        );
    };

    let cache_key = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
        .to_string();

    if let CacheResult::Hit(value) = state.cache.get(&cache_key) {
        debug!("Cache hit: {}", uri.path());
        return success_response(&state, origin, &value, "HIT");
    }

    info!("Cache miss, fetching from upstream: {}", uri.path());

    match fetch_upstream(&state, service_key, &uri).await {
        Ok(value) => {
            state.store_in_background(cache_key, value.clone());
            success_response(&state, origin, &value, "MISS")
        }
        Err(err) => {
            let message = redact_credential(&public_message(&err), Some(service_key));
            error!("Upstream request for {} failed: {}", uri.path(), message);

            let mut body = json!({ "error": message });
            if state.config.expose_error_details {
                body["details"] = Value::String(redact_credential(
                    &format!("{:?}", err),
                    Some(service_key),
                ));
            }
            error_response(StatusCode::INTERNAL_SERVER_ERROR, origin, body)
        }
    }
}

/// Upstream URL: fixed host + inbound path + credential + inbound query
pub fn upstream_url(base: &str, service_key: &str, uri: &Uri) -> String {
    let encoded_key: String =
        url::form_urlencoded::byte_serialize(service_key.as_bytes()).collect();
    let mut url = format!(
        "{}{}?serviceKey={}",
        base.trim_end_matches('/'),
        uri.path(),
        encoded_key
    );
    if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
        url.push('&');
        url.push_str(query);
    }
    url
}

async fn fetch_upstream(state: &ProxyState, service_key: &str, uri: &Uri) -> Result<Value> {
    let url = upstream_url(&state.config.upstream_base, service_key, uri);
    let response = state.fetcher.fetch(&url).await?;

    if !response.is_success() {
        return Err(TourError::http_status(
            response.status,
            format!("API request failed ({}): {}", response.status, response.body),
        ));
    }

    serde_json::from_str(&response.body)
        .map_err(|e| TourError::Format(format!("Upstream body is not valid JSON: {}", e)))
}

/// Message for the `error` field; upstream failures already carry their own
fn public_message(err: &TourError) -> String {
    match err {
        TourError::Upstream { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn success_response(state: &ProxyState, origin: HeaderValue, value: &Value, cache_status: &'static str) -> Response {
    let mut headers = cors_headers(origin);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(cache_control) =
        HeaderValue::from_str(&format!("public, max-age={}", state.cache.ttl().as_secs()))
    {
        headers.insert(header::CACHE_CONTROL, cache_control);
    }
    headers.insert(X_CACHE, HeaderValue::from_static(cache_status));
    (StatusCode::OK, headers, value.to_string()).into_response()
}

fn error_response(status: StatusCode, origin: HeaderValue, body: Value) -> Response {
    let mut headers = cors_headers(origin);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    (status, headers, body.to_string()).into_response()
}
