//! The cached outcome of one submission.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Which delivery path produced a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMethod {
    /// Direct JSON POST whose response is read back.
    #[default]
    Fetch,
    /// Form-encoded POST whose response is never observed.
    Form,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub method: SubmitMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ExecutionResult {
    /// Result of a direct call that received a response, whatever its status.
    pub fn fetched(status: u16, data: Value, content_type: impl Into<String>) -> Self {
        Self {
            success: (200..300).contains(&status),
            status,
            data,
            content_type: content_type.into(),
            method: SubmitMethod::Fetch,
            timestamp: Some(now_iso()),
        }
    }

    /// Result of a direct call that never completed.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: 0,
            data: json!({ "error": message.into() }),
            content_type: String::new(),
            method: SubmitMethod::Fetch,
            timestamp: Some(now_iso()),
        }
    }

    /// Optimistic record written by the form path before anything is known.
    pub fn form_dispatched() -> Self {
        Self {
            success: true,
            status: 200,
            data: json!({
                "message": "Sent via the alternative method; delivery is unconfirmed - check the destination for the report",
            }),
            content_type: "text/html".into(),
            method: SubmitMethod::Form,
            timestamp: Some(now_iso()),
        }
    }

    /// The `data.html` string, when present and non-empty.
    pub fn html_fragment(&self) -> Option<&str> {
        self.data
            .get("html")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Interprets a response body: JSON when it parses, otherwise `{html, raw}` around the text.
pub fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "html": text, "raw": text }))
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_fields() {
        let result = ExecutionResult::fetched(200, json!({"html": "<p>ok</p>"}), "application/json");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["contentType"], "application/json");
        assert_eq!(value["method"], "fetch");
        assert_eq!(value["success"], true);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn legacy_record_without_optional_fields_parses() {
        let parsed: ExecutionResult =
            serde_json::from_str(r#"{"success":true,"status":200,"data":{"message":"x"}}"#).unwrap();
        assert_eq!(parsed.method, SubmitMethod::Fetch);
        assert_eq!(parsed.content_type, "");
        assert_eq!(parsed.timestamp, None);
    }

    #[test]
    fn non_2xx_status_is_not_success() {
        assert!(!ExecutionResult::fetched(500, Value::Null, "").success);
        assert!(!ExecutionResult::fetched(302, Value::Null, "").success);
        assert!(ExecutionResult::fetched(204, Value::Null, "").success);
    }

    #[test]
    fn parse_body_falls_back_to_html_wrapper() {
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body("<h1>hi</h1>"), json!({"html": "<h1>hi</h1>", "raw": "<h1>hi</h1>"}));
    }

    #[test]
    fn empty_html_is_not_a_fragment() {
        let result = ExecutionResult::fetched(200, json!({"html": ""}), "");
        assert_eq!(result.html_fragment(), None);
    }
}
