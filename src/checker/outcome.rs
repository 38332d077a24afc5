// src/checker/outcome.rs
// =============================================================================
// The vocabulary every other part of the checker speaks.
//
// - StatusKind: the closed set of outcomes a probe (or a cached entry) can have
// - Outcome: what a probe produced for one URL
// - CheckResult: one Outcome tied back to the catalog item and resource it
//   came from; this is the unit written into the report
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability verdict for a single URL.
///
/// Serialized in lowercase (`"ok"`, `"redirected"`, ...) both in the report
/// and in the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Reached without any redirect
    Ok,
    /// Reached after following one or more redirects
    Redirected,
    /// Server answered with a failure status code
    Broken,
    /// No answer within the configured deadline
    Timeout,
    /// Transport failure (DNS, refused connection, TLS, ...)
    Error,
    /// Not an absolute http/https URL, never probed
    Invalid,
}

impl StatusKind {
    /// Every variant, in report order.
    pub const ALL: [StatusKind; 6] = [
        StatusKind::Ok,
        StatusKind::Redirected,
        StatusKind::Broken,
        StatusKind::Timeout,
        StatusKind::Error,
        StatusKind::Invalid,
    ];

    /// Statuses that land in the report's `broken` list.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            StatusKind::Broken | StatusKind::Timeout | StatusKind::Error | StatusKind::Invalid
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Ok => "ok",
            StatusKind::Redirected => "redirected",
            StatusKind::Broken => "broken",
            StatusKind::Timeout => "timeout",
            StatusKind::Error => "error",
            StatusKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a probe concluded about one URL.
///
/// `code` is the final HTTP status, or 0 when no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub status: StatusKind,
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub final_url: String,
    #[serde(default)]
    pub reason: String,
}

impl Outcome {
    pub fn new(status: StatusKind, code: u16, final_url: impl Into<String>) -> Self {
        Outcome {
            status,
            code,
            final_url: final_url.into(),
            reason: String::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    // Rejected before any network activity
    pub fn invalid(url: &str) -> Self {
        Outcome::new(StatusKind::Invalid, 0, url)
    }
}

/// One checked resource, as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub chapter: i64,
    pub pattern: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub url: String,
    pub status: StatusKind,
    pub code: u16,
    pub final_url: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&StatusKind::Redirected).unwrap();
        assert_eq!(json, "\"redirected\"");

        let parsed: StatusKind = serde_json::from_str("\"timeout\"").unwrap();
        assert_eq!(parsed, StatusKind::Timeout);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let parsed: Result<StatusKind, _> = serde_json::from_str("\"maybe\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_failure_statuses() {
        let failures: Vec<_> = StatusKind::ALL
            .iter()
            .copied()
            .filter(|s| s.is_failure())
            .collect();
        assert_eq!(
            failures,
            vec![
                StatusKind::Broken,
                StatusKind::Timeout,
                StatusKind::Error,
                StatusKind::Invalid
            ]
        );
    }

    #[test]
    fn test_check_result_field_names() {
        let result = CheckResult {
            chapter: 3,
            pattern: "-고 있다".to_string(),
            kind: "video".to_string(),
            title: "Lesson".to_string(),
            url: "https://youtu.be/abc123".to_string(),
            status: StatusKind::Ok,
            code: 200,
            final_url: "https://www.youtube.com/watch?v=abc123".to_string(),
            reason: "oembed-ok".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["finalUrl"], "https://www.youtube.com/watch?v=abc123");
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_outcome_defaults_missing_fields() {
        let outcome: Outcome = serde_json::from_str(r#"{"status":"broken","code":404}"#).unwrap();
        assert_eq!(outcome.status, StatusKind::Broken);
        assert_eq!(outcome.final_url, "");
        assert_eq!(outcome.reason, "");
    }
}
