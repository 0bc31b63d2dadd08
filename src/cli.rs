//! CLI orchestration module
//!
//! Testable pieces of the `tour-proxy` binary: argument parsing, cache flag
//! handling and turning client results into output envelopes. The binary
//! entry point only wires these together.

use crate::cache::{CacheConfig, CacheOptions};
use crate::client::{ApiError, ApiResult, Locale, Paging, QueryParams, ResponseEnvelope, SearchFilters};
use crate::error::{Result, TourError};
use crate::output::OutputEnvelope;
use serde_json::Value;
use std::time::Instant;

/// Envelope kind for `call`
pub const KIND_CALL: &str = "call_result";

/// Envelope kind for `search`
pub const KIND_SEARCH: &str = "search_result";

/// Cache configuration helper
pub struct CacheConfigBuilder;

impl CacheConfigBuilder {
    /// Apply `--no-cache` / `--cache-ttl` on top of the configured cache
    pub fn from_cli_flags(base: CacheConfig, no_cache: bool, cache_ttl: Option<u64>) -> CacheConfig {
        let mut options = CacheOptions::new();
        if no_cache {
            options = options.with_enabled(false);
        }
        if let Some(ttl) = cache_ttl {
            options = options.with_ttl(ttl);
        }
        base.with_options(options)
    }
}

/// Argument parser for operation parameters
pub struct ArgumentParser;

impl ArgumentParser {
    /// Parse `key=value` pairs and an optional JSON object into query params.
    ///
    /// The JSON payload is applied after the pairs, so it wins on conflicts.
    pub fn parse_arguments(args: Vec<String>, json_payload: Option<String>) -> Result<QueryParams> {
        let mut params = QueryParams::new();

        for arg in args {
            match arg.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    params.insert(key.trim(), value);
                }
                _ => {
                    return Err(TourError::Validation(format!(
                        "Invalid argument '{}': expected key=value",
                        arg
                    )))
                }
            }
        }

        if let Some(json_str) = json_payload {
            let value: Value = serde_json::from_str(&json_str)
                .map_err(|e| TourError::Validation(format!("Invalid JSON payload: {}", e)))?;
            let obj = value.as_object().ok_or_else(|| {
                TourError::Validation("JSON payload must be an object".to_string())
            })?;

            for (key, value) in obj {
                match value {
                    Value::Null => {}
                    Value::Array(values) => {
                        let values = values
                            .iter()
                            .map(|v| scalar_to_string(key, v))
                            .collect::<Result<Vec<_>>>()?;
                        params.insert_many(key.as_str(), values);
                    }
                    other => params.insert(key.as_str(), scalar_to_string(key, other)?),
                }
            }
        }

        Ok(params)
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(TourError::Validation(format!(
            "Parameter '{}' must be a string, number or boolean",
            key
        ))),
    }
}

/// Search flags as given on the command line
#[derive(Debug, Clone, Default)]
pub struct SearchFlags {
    pub keyword: Option<String>,
    pub area: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
}

impl SearchFlags {
    pub fn into_filters(self) -> (SearchFilters, Paging) {
        let paging = self.page.map(Paging::page).unwrap_or_default();
        let filters = SearchFilters {
            keyword: self.keyword.unwrap_or_default(),
            area_code: self.area,
            category: self.category,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        (filters, paging)
    }
}

/// Turn a client result into the output envelope printed by the binary
pub fn to_output(
    kind: &str,
    locale: &str,
    endpoint: Option<&str>,
    result: ApiResult<ResponseEnvelope>,
    started: Instant,
) -> OutputEnvelope {
    let duration_ms = started.elapsed().as_millis() as u64;
    let data = result.and_then(|envelope| {
        serde_json::to_value(&envelope).map_err(|e| {
            ApiError::new(
                Locale::Ko,
                None,
                TourError::Format(format!("Failed to serialize response: {}", e)),
            )
        })
    });

    match data {
        Ok(data) => OutputEnvelope::success(kind, locale, endpoint.unwrap_or_default(), data, Some(duration_ms)),
        Err(err) => error_output(&err, Some(locale), endpoint).with_duration(duration_ms),
    }
}

/// Error envelope for a client failure
pub fn error_output(err: &ApiError, locale: Option<&str>, endpoint: Option<&str>) -> OutputEnvelope {
    OutputEnvelope::error(err.code(), &err.message).with_context(locale, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments_with_json() {
        let json = r#"{"areaCode": "1", "pageNo": 2, "imageYN": true, "skip": null}"#;
        let result = ArgumentParser::parse_arguments(vec![], Some(json.to_string())).unwrap();
        assert_eq!(result.get_str("areaCode"), Some("1"));
        assert_eq!(result.get_str("pageNo"), Some("2"));
        assert_eq!(result.get_str("imageYN"), Some("true"));
        assert!(!result.contains_key("skip"));
    }

    #[test]
    fn test_parse_arguments_with_key_value() {
        let args = vec!["areaCode=1".to_string(), "keyword=a=b".to_string()];
        let result = ArgumentParser::parse_arguments(args, None).unwrap();
        assert_eq!(result.get_str("areaCode"), Some("1"));
        assert_eq!(result.get_str("keyword"), Some("a=b"));
    }

    #[test]
    fn test_parse_arguments_json_wins() {
        let args = vec!["areaCode=1".to_string()];
        let result =
            ArgumentParser::parse_arguments(args, Some(r#"{"areaCode": "2"}"#.to_string())).unwrap();
        assert_eq!(result.get_str("areaCode"), Some("2"));
    }

    #[test]
    fn test_parse_arguments_json_array() {
        let result =
            ArgumentParser::parse_arguments(vec![], Some(r#"{"cat2": ["A0101", "A0102"]}"#.to_string()))
                .unwrap();
        assert_eq!(
            result.to_query_string(),
            "cat2=A0101&cat2=A0102"
        );
    }

    #[test]
    fn test_parse_arguments_empty() {
        let result = ArgumentParser::parse_arguments(vec![], None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_arguments_missing_equals() {
        let err = ArgumentParser::parse_arguments(vec!["areaCode".to_string()], None).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_parse_arguments_invalid_json() {
        let result = ArgumentParser::parse_arguments(vec![], Some("{invalid json}".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_arguments_json_not_object() {
        let json = r#"["array", "not", "object"]"#;
        let result = ArgumentParser::parse_arguments(vec![], Some(json.to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_arguments_nested_object_rejected() {
        let json = r#"{"filter": {"a": 1}}"#;
        assert!(ArgumentParser::parse_arguments(vec![], Some(json.to_string())).is_err());
    }

    #[test]
    fn test_cache_config_builder_no_cache() {
        let config = CacheConfigBuilder::from_cli_flags(CacheConfig::proxy_default(), true, None);
        assert!(!config.enabled);
        assert_eq!(config.ttl, 600);
    }

    #[test]
    fn test_cache_config_builder_with_ttl() {
        let config = CacheConfigBuilder::from_cli_flags(CacheConfig::client_default(), false, Some(3600));
        assert!(config.enabled);
        assert_eq!(config.ttl, 3600);
    }

    #[test]
    fn test_cache_config_builder_keeps_base() {
        let base = CacheConfig::new(true, 42, 10);
        assert_eq!(CacheConfigBuilder::from_cli_flags(base.clone(), false, None), base);
    }

    #[test]
    fn test_search_flags_into_filters() {
        let (filters, paging) = SearchFlags {
            keyword: Some("palace".to_string()),
            page: Some(3),
            ..SearchFlags::default()
        }
        .into_filters();
        assert_eq!(filters.keyword, "palace");
        assert_eq!(paging.page_no, 3);

        let (filters, paging) = SearchFlags::default().into_filters();
        assert!(filters.keyword.is_empty());
        assert_eq!(paging, Paging::default());
    }

    #[test]
    fn test_error_output() {
        let err = ApiError::new(
            Locale::En,
            None,
            TourError::Validation("Unsupported language: xx".to_string()),
        );
        let output = error_output(&err, Some("xx"), Some("areaBasedList2"));
        assert!(!output.ok);
        let info = output.error.unwrap();
        assert_eq!(info.code, "VALIDATION_ERROR");
        assert_eq!(info.message, "Unsupported language: xx");
        assert_eq!(output.endpoint.as_deref(), Some("areaBasedList2"));
    }

    #[test]
    fn test_to_output_success() {
        let envelope: ResponseEnvelope = serde_json::from_value(serde_json::json!({
            "header": {"resultCode": "0000", "resultMsg": "OK"},
            "body": {"totalCount": 0}
        }))
        .unwrap();
        let output = to_output(KIND_CALL, "ko", Some("areaCode2"), Ok(envelope), Instant::now());
        assert!(output.ok);
        assert_eq!(output.data.unwrap()["header"]["resultCode"], "0000");
        assert!(output.meta.duration_ms.is_some());
    }
}
