//! Request and response types exchanged between router and adapters.

use crate::{Backend, Intent, Result, SwitchboardError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted request size in bytes.
pub const MAX_REQUEST_LENGTH: usize = 10_000;

/// Text returned by the document search backend when nothing matched.
pub const NOT_FOUND_SENTINEL: &str = "Not found in repository.";

/// A caller's natural-language request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Correlation ID for logs
    pub id: String,

    /// Trimmed request text, never empty
    pub text: String,
}

impl Request {
    pub fn new(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(SwitchboardError::InvalidRequest(
                "request text must not be empty".into(),
            ));
        }
        if text.len() > MAX_REQUEST_LENGTH {
            return Err(SwitchboardError::InvalidRequest(format!(
                "request exceeds maximum length of {} bytes",
                MAX_REQUEST_LENGTH
            )));
        }

        Ok(Self {
            id: format!("req_{}", uuid::Uuid::new_v4()),
            text: text.to_string(),
        })
    }

    /// Short prefix of the request for log lines.
    pub fn preview(&self) -> String {
        self.text.chars().take(50).collect()
    }
}

/// Normalized output of a single adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterResult {
    pub text: String,

    /// Only set by document search: whether a relevant passage was located
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
}

impl AdapterResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            found: None,
        }
    }

    pub fn found(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            found: Some(true),
        }
    }

    pub fn not_found() -> Self {
        Self {
            text: NOT_FOUND_SENTINEL.to_string(),
            found: Some(false),
        }
    }

    pub fn is_found(&self) -> bool {
        self.found == Some(true)
    }
}

/// A labelled portion of the composed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSection {
    pub backend: Backend,
    pub text: String,
}

impl ResponseSection {
    pub fn render(&self) -> String {
        format!("{}{}", self.backend.source_label(), self.text)
    }
}

/// The final answer for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedResponse {
    pub request_id: String,
    pub intent: Intent,
    pub sections: Vec<ResponseSection>,
    pub fallback_used: bool,
}

impl RoutedResponse {
    /// Each section prefixed with its source label, in invocation order.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(ResponseSection::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn backends(&self) -> Vec<Backend> {
        self.sections.iter().map(|s| s.backend).collect()
    }
}

impl fmt::Display for RoutedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_trimmed() {
        let request = Request::new("  How do I reset my password?\n").unwrap();
        assert_eq!(request.text, "How do I reset my password?");
        assert!(request.id.starts_with("req_"));
    }

    #[test]
    fn empty_request_rejected() {
        assert!(matches!(
            Request::new("   "),
            Err(SwitchboardError::InvalidRequest(_))
        ));
    }

    #[test]
    fn oversized_request_rejected() {
        let text = "x".repeat(MAX_REQUEST_LENGTH + 1);
        assert!(Request::new(text).is_err());
    }

    #[test]
    fn request_ids_are_unique() {
        let a = Request::new("one").unwrap();
        let b = Request::new("one").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn found_flag_semantics() {
        assert!(AdapterResult::found("passage").is_found());
        assert!(!AdapterResult::not_found().is_found());
        assert!(!AdapterResult::text("reply").is_found());
        assert_eq!(AdapterResult::not_found().text, NOT_FOUND_SENTINEL);
    }

    #[test]
    fn routed_response_renders_sections_in_order() {
        let response = RoutedResponse {
            request_id: "req_1".into(),
            intent: Intent::DocumentSearch,
            sections: vec![
                ResponseSection {
                    backend: Backend::DocumentSearch,
                    text: NOT_FOUND_SENTINEL.into(),
                },
                ResponseSection {
                    backend: Backend::WebSearch,
                    text: "Version 2.0 was released.".into(),
                },
            ],
            fallback_used: true,
        };

        assert_eq!(
            response.text(),
            "Document Search: Not found in repository.\n\nWeb Search: Version 2.0 was released."
        );
        assert_eq!(response.to_string(), response.text());
    }

    #[test]
    fn adapter_result_omits_absent_found() {
        let json = serde_json::to_value(AdapterResult::text("hi")).unwrap();
        assert!(json.get("found").is_none());
    }
}
