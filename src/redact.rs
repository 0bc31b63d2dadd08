//! Credential scrubbing for anything that leaves the proxy

use regex::Regex;
use std::sync::OnceLock;

pub const REDACTED: &str = "[REDACTED]";

fn service_key_param() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(serviceKey=)[^&\s"'<>]+"#).expect("valid serviceKey pattern")
    })
}

/// Remove the upstream credential from a message.
///
/// Every `serviceKey=<value>` query fragment is rewritten to
/// `serviceKey=[REDACTED]`, then any remaining literal occurrence of the
/// secret (raw or percent-encoded) is replaced as well.
pub fn redact_credential(message: &str, secret: Option<&str>) -> String {
    let mut redacted = service_key_param()
        .replace_all(message, format!("${{1}}{}", REDACTED).as_str())
        .into_owned();

    if let Some(secret) = secret.filter(|s| !s.is_empty()) {
        let encoded: String = url::form_urlencoded::byte_serialize(secret.as_bytes()).collect();
        redacted = redacted.replace(secret, REDACTED);
        if encoded != secret {
            redacted = redacted.replace(&encoded, REDACTED);
        }
    }

    redacted
}

/// Mask a secret for display (show only first 4 and last 2 characters)
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_service_key_param() {
        let message = "API request failed: https://apis.data.go.kr/B551011/KorService2/areaBasedList2?serviceKey=ABCD1234&areaCode=1";
        let redacted = redact_credential(message, None);

        assert!(!redacted.contains("ABCD1234"));
        assert!(redacted.contains("serviceKey=[REDACTED]&areaCode=1"));
    }

    #[test]
    fn test_redacts_param_case_insensitively() {
        let redacted = redact_credential("url?SERVICEKEY=secret-value", None);
        assert_eq!(redacted, "url?SERVICEKEY=[REDACTED]");
    }

    #[test]
    fn test_redacts_literal_secret_outside_query() {
        let redacted = redact_credential("key ABCD1234 rejected", Some("ABCD1234"));
        assert_eq!(redacted, "key [REDACTED] rejected");
    }

    #[test]
    fn test_redacts_percent_encoded_secret() {
        let secret = "ab+cd/ef==";
        let message = "echo: ab%2Bcd%2Fef%3D%3D";
        let redacted = redact_credential(message, Some(secret));
        assert_eq!(redacted, "echo: [REDACTED]");
    }

    #[test]
    fn test_leaves_clean_messages_alone() {
        let message = "API request failed (502): Bad Gateway";
        assert_eq!(redact_credential(message, Some("ABCD1234")), message);
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("ABCD1234EFGH"), "ABCD...GH");
        assert_eq!(mask_secret("short"), "*****");
    }
}
