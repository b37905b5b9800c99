//! Offline keyword classifier.
//!
//! Deterministic and free of external calls. Only used when configured with
//! `classifier.mode = "keyword"`; a failing reasoning service never falls
//! back to it.

use async_trait::async_trait;
use switchboard_common::{Intent, Request, Result};
use tracing::debug;

const TICKET_PHRASES: &[&str] = &[
    "create a ticket",
    "create ticket",
    "make a ticket",
    "open a ticket",
    "laptop not working",
    "computer not working",
    "system not working",
    "need help",
    "need support",
    "steps didn't work",
    "report issue",
    "report problem",
    "submit ticket",
];

const DOCUMENT_PATTERNS: &[&str] = &[
    "how to",
    "procedure",
    "policy",
    "internal",
    "company",
    "system",
    "process",
    "documentation",
    "guide",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(text: &str) -> Intent {
        let lower = text.to_lowercase();
        if TICKET_PHRASES.iter().any(|p| lower.contains(p)) {
            Intent::Ticket
        } else if DOCUMENT_PATTERNS.iter().any(|p| lower.contains(p)) {
            Intent::DocumentSearch
        } else {
            Intent::WebSearch
        }
    }
}

#[async_trait]
impl crate::classifier::Classifier for KeywordClassifier {
    async fn classify(&self, request: &Request) -> Result<Intent> {
        let intent = Self::classify_text(&request.text);
        debug!(request_id = %request.id, intent = %intent, "Keyword classification");
        Ok(intent)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_phrases_take_priority() {
        assert_eq!(
            KeywordClassifier::classify_text("I need to create a ticket for my laptop not working"),
            Intent::Ticket
        );
        assert_eq!(
            KeywordClassifier::classify_text("The system not working again, need support"),
            Intent::Ticket
        );
    }

    #[test]
    fn internal_questions_go_to_documents() {
        assert_eq!(
            KeywordClassifier::classify_text("What is the company expenses policy?"),
            Intent::DocumentSearch
        );
        assert_eq!(
            KeywordClassifier::classify_text("How to connect to the VPN"),
            Intent::DocumentSearch
        );
    }

    #[test]
    fn everything_else_is_web_search() {
        assert_eq!(
            KeywordClassifier::classify_text("What's the weather in London?"),
            Intent::WebSearch
        );
    }
}
