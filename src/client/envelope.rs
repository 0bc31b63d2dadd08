//! Upstream response envelope
//!
//! Every upstream operation answers with the same wrapper:
//!
//! ```json
//! {"response": {"header": {"resultCode": "0000", "resultMsg": "OK"},
//!               "body": {"items": {"item": [...]}, "numOfRows": 12, "pageNo": 1, "totalCount": 40}}}
//! ```
//!
//! Failures reported by the gateway in front of the API use a different,
//! unwrapped shape (`{"responseTime": ..., "resultCode": ..., "resultMsg": ...}`).
//! [`Envelope::decode`] tells the shapes apart once, at the boundary.

use crate::error::{Result, TourError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Result code the upstream uses for success
pub const SUCCESS_CODE: &str = "0000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHeader {
    pub result_code: String,
    #[serde(default)]
    pub result_msg: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Items<T> {
    #[serde(default = "Vec::new", deserialize_with = "one_or_many")]
    pub item: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResponseBody<T> {
    /// Missing, `null` and `""` all mean an empty result set
    #[serde(default, deserialize_with = "items_or_none")]
    pub items: Option<Items<T>>,
    #[serde(default)]
    pub num_of_rows: u32,
    #[serde(default)]
    pub page_no: u32,
    #[serde(default)]
    pub total_count: u64,
}

impl<T> Default for ResponseBody<T> {
    fn default() -> Self {
        Self {
            items: None,
            num_of_rows: 0,
            page_no: 0,
            total_count: 0,
        }
    }
}

impl<T> ResponseBody<T> {
    /// The result items; empty when the upstream sent none
    pub fn items(&self) -> &[T] {
        self.items
            .as_ref()
            .map(|items| items.item.as_slice())
            .unwrap_or_default()
    }
}

/// A successful upstream response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResponseEnvelope<T = Value> {
    pub header: ResponseHeader,
    #[serde(default)]
    pub body: ResponseBody<T>,
}

impl<T> ResponseEnvelope<T> {
    pub fn items(&self) -> &[T] {
        self.body.items()
    }

    pub fn total_count(&self) -> u64 {
        self.body.total_count
    }
}

impl ResponseEnvelope<Value> {
    /// Re-read the items with an endpoint-specific schema
    pub fn items_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.items()
            .iter()
            .map(|item| {
                serde_json::from_value(item.clone())
                    .map_err(|e| TourError::Format(format!("Unexpected item shape: {}", e)))
            })
            .collect()
    }
}

/// Classification of a decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(ResponseEnvelope),
    UpstreamError { code: String, message: String },
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnvelope {
    Failure(GatewayFailure),
    Wrapped { response: WrappedResponse },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayFailure {
    #[allow(dead_code)]
    response_time: Value,
    result_code: Value,
    #[serde(default)]
    result_msg: Option<String>,
}

#[derive(Deserialize)]
struct WrappedResponse {
    #[serde(default)]
    header: Option<RawHeader>,
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeader {
    #[serde(default)]
    result_code: Option<String>,
    #[serde(default)]
    result_msg: Option<String>,
}

impl Envelope {
    /// Classify a response body
    pub fn decode(value: &Value) -> Envelope {
        let raw = match RawEnvelope::deserialize(value) {
            Ok(raw) => raw,
            Err(_) => return Envelope::Unrecognized,
        };

        match raw {
            RawEnvelope::Failure(failure) => {
                let code = match failure.result_code {
                    Value::String(code) => code,
                    other => other.to_string(),
                };
                let message = format!(
                    "API Error ({}): {}",
                    code,
                    failure
                        .result_msg
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "Unknown error".to_string())
                );
                Envelope::UpstreamError { code, message }
            }
            RawEnvelope::Wrapped { response } => {
                let Some(header) = response.header else {
                    return Envelope::Unrecognized;
                };

                if header.result_code.as_deref() != Some(SUCCESS_CODE) {
                    let code = header.result_code.unwrap_or_else(|| "unknown".to_string());
                    let message = header
                        .result_msg
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| format!("API Error ({})", code));
                    return Envelope::UpstreamError { code, message };
                }

                let body = match response.body {
                    None | Some(Value::Null) => Ok(ResponseBody::default()),
                    Some(body) => ResponseBody::deserialize(body),
                };
                match body {
                    Ok(body) => Envelope::Success(ResponseEnvelope {
                        header: ResponseHeader {
                            result_code: SUCCESS_CODE.to_string(),
                            result_msg: header.result_msg.unwrap_or_default(),
                        },
                        body,
                    }),
                    Err(_) => Envelope::Unrecognized,
                }
            }
        }
    }

    /// Success as data, everything else as an error
    pub fn into_result(self) -> Result<ResponseEnvelope> {
        match self {
            Envelope::Success(envelope) => Ok(envelope),
            Envelope::UpstreamError { code, message } => Err(TourError::Upstream { code, message }),
            Envelope::Unrecognized => Err(TourError::Format(
                "Unexpected response format from API".to_string(),
            )),
        }
    }
}

fn items_or_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<Items<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
    enum Repr<T> {
        Items(Items<T>),
        Blank(String),
    }

    match Option::<Repr<T>>::deserialize(deserializer)? {
        Some(Repr::Items(items)) => Ok(Some(items)),
        Some(Repr::Blank(s)) if s.trim().is_empty() => Ok(None),
        Some(Repr::Blank(s)) => Err(serde::de::Error::custom(format!(
            "unexpected items value: {}",
            s
        ))),
        None => Ok(None),
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
    enum Repr<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Repr::<T>::deserialize(deserializer)? {
        Repr::Many(items) => items,
        Repr::One(item) => vec![item],
    })
}
