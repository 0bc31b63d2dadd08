//! tour-proxy error types

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TourError>;

#[derive(Error, Debug)]
pub enum TourError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream error ({code}): {message}")]
    Upstream { code: String, message: String },

    #[error("Unexpected response format: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TourError {
    /// Upstream failure carrying an HTTP status rather than a result code.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        TourError::Upstream {
            code: format!("HTTP {}", status),
            message: message.into(),
        }
    }

    /// Whether the failure happened below the HTTP layer (connect, reset, body read).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TourError::Network(_) | TourError::Io(_) | TourError::Generic(_)
        )
    }

    /// Machine-readable error code used in output envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            TourError::Validation(_) => "VALIDATION_ERROR",
            TourError::Timeout(_) => "TIMEOUT",
            TourError::Upstream { .. } => "UPSTREAM_ERROR",
            TourError::Format(_) => "FORMAT_ERROR",
            TourError::Config(_) => "CONFIG_ERROR",
            TourError::Network(_) => "NETWORK_ERROR",
            TourError::Io(_) => "IO_ERROR",
            TourError::Generic(_) => "INTERNAL_ERROR",
        }
    }
}
