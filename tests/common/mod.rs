//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tour_proxy::error::{Result, TourError};
use tour_proxy::fetch::{FetchResponse, HttpTransport, ResilientFetcher, RetryPolicy};

/// One scripted reaction of [`ScriptedTransport`]
pub enum Reply {
    Respond(u16, String),
    Fail(String),
    Hang(Duration),
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Respond(200, body.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Respond(status, body.into())
    }
}

/// Transport that replays a script and records every URL it was asked for.
///
/// Once the script runs out, the last reply is repeated.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<(u16, String)>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback: Mutex::new(None),
            urls: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request with the same status and body
    pub fn always(status: u16, body: impl Into<String>) -> Arc<Self> {
        let transport = Self::new(Vec::new());
        *transport.fallback.lock().unwrap() = Some((status, body.into()));
        transport
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.urls.lock().unwrap().push(url.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Respond(status, body)) => {
                *self.fallback.lock().unwrap() = Some((status, body.clone()));
                Ok(FetchResponse::new(status, body))
            }
            Some(Reply::Fail(message)) => Err(TourError::Generic(anyhow::anyhow!(message))),
            Some(Reply::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(FetchResponse::new(200, "{}"))
            }
            None => {
                let fallback = self.fallback.lock().unwrap().clone();
                let (status, body) = fallback.expect("transport called more often than scripted");
                Ok(FetchResponse::new(status, body))
            }
        }
    }
}

/// Retry policy with millisecond backoff so retry tests stay fast
pub fn fast_policy(timeout: Duration, max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(timeout, max_retries).with_base_backoff(Duration::from_millis(1))
}

pub fn scripted_fetcher(transport: &Arc<ScriptedTransport>, max_retries: u32) -> ResilientFetcher {
    ResilientFetcher::new(
        transport.clone(),
        fast_policy(Duration::from_millis(200), max_retries),
    )
}

/// A successful upstream envelope holding `items`
pub fn success_body(items: serde_json::Value) -> String {
    serde_json::json!({
        "response": {
            "header": {"resultCode": "0000", "resultMsg": "OK"},
            "body": {
                "items": {"item": items},
                "numOfRows": 12,
                "pageNo": 1,
                "totalCount": 1
            }
        }
    })
    .to_string()
}
