//! Output formatting - deterministic JSON envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope schema version
pub const ENVELOPE_VERSION: &str = "v1";

/// Standard CLI output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEnvelope {
    /// Indicates success or failure
    pub ok: bool,

    /// Output kind (call_result, search_result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Locale code the call ran under (present when known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Upstream operation name (present when known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Upstream response envelope (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error information (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Metadata
    pub meta: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,

    /// Execution duration in milliseconds when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Metadata {
    fn new(duration_ms: Option<u64>) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            duration_ms,
        }
    }
}

impl OutputEnvelope {
    /// Create a success response
    pub fn success(kind: &str, locale: &str, endpoint: &str, data: Value, duration_ms: Option<u64>) -> Self {
        Self {
            ok: true,
            kind: Some(kind.to_string()),
            locale: Some(locale.to_string()),
            endpoint: Some(endpoint.to_string()),
            data: Some(data),
            error: None,
            meta: Metadata::new(duration_ms),
        }
    }

    /// Create an error response
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            kind: None,
            locale: None,
            endpoint: None,
            data: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message: message.to_string(),
            }),
            meta: Metadata::new(None),
        }
    }

    /// Attach the call context to an error response
    pub fn with_context(mut self, locale: Option<&str>, endpoint: Option<&str>) -> Self {
        self.locale = locale.map(ToString::to_string);
        self.endpoint = endpoint.map(ToString::to_string);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = Some(duration_ms);
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
