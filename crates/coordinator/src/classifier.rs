//! Intent classification.

use std::sync::Arc;

use async_trait::async_trait;
use switchboard_common::{Intent, Request, Result, SwitchboardError};
use switchboard_llm::{LlmClient, LlmRequest};
use tracing::{debug, warn};

/// Assigns exactly one [`Intent`] to a request.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &Request) -> Result<Intent>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    async fn classify(&self, request: &Request) -> Result<Intent> {
        (**self).classify(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

const CLASSIFIER_PROMPT: &str = r#"You are an intelligent request router for an IT help desk serving a UK audience.

Decide which backend should handle the user's request:

1. TICKET: the user wants a support ticket opened or reports a fault that needs a technician
   - "create a ticket", "open a ticket", "submit ticket", "report a problem"
   - "my laptop is not working", "the steps didn't work, I need support"

2. DOCUMENT_SEARCH: the answer is likely in internal documentation
   - "how to" questions about internal systems and procedures
   - company policies, guidelines, internal processes

3. WEB_SEARCH: the answer needs external or current information
   - news, current events, software versions, general knowledge

Respond with ONLY one of these exact labels: TICKET, DOCUMENT_SEARCH, WEB_SEARCH
Do not provide any explanation or additional text.
"#;

/// Reasoning-service classifier.
pub struct LlmClassifier {
    llm: Arc<dyn LlmClient>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn build_request(request: &Request) -> LlmRequest {
        LlmRequest::prompt(format!("{CLASSIFIER_PROMPT}\nUser Request: {}", request.text))
            .with_temperature(0.0)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, request: &Request) -> Result<Intent> {
        let response = self
            .llm
            .complete(Self::build_request(request))
            .await
            .map_err(|e| {
                warn!(request_id = %request.id, error = %e, "Classification call failed");
                SwitchboardError::ClassificationUnavailable(e.to_string())
            })?;

        let intent = parse_intent_reply(&response.content);
        debug!(
            request_id = %request.id,
            reply = %response.content.trim(),
            intent = %intent,
            "Classifier reply parsed"
        );
        Ok(intent)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

/// Map a raw classifier reply onto an intent.
///
/// Markers are checked in [`Intent::PRIORITY`] order and the first hit wins,
/// even when the reply mentions several labels. A reply with no marker is
/// treated as a web search.
pub fn parse_intent_reply(reply: &str) -> Intent {
    let upper = reply.to_uppercase();
    Intent::PRIORITY
        .into_iter()
        .find(|intent| intent.markers().iter().any(|m| upper.contains(m)))
        .unwrap_or(Intent::WebSearch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_labels() {
        assert_eq!(parse_intent_reply("TICKET"), Intent::Ticket);
        assert_eq!(parse_intent_reply("DOCUMENT_SEARCH"), Intent::DocumentSearch);
        assert_eq!(parse_intent_reply("WEB_SEARCH"), Intent::WebSearch);
    }

    #[test]
    fn labels_are_case_insensitive_and_embedded() {
        assert_eq!(
            parse_intent_reply("The answer is: document_search."),
            Intent::DocumentSearch
        );
        assert_eq!(parse_intent_reply("ROUTE_TO_FILE_SEARCH_AGENT"), Intent::DocumentSearch);
    }

    #[test]
    fn ticket_wins_over_other_markers() {
        assert_eq!(parse_intent_reply("WEB_SEARCH or TICKET"), Intent::Ticket);
        assert_eq!(
            parse_intent_reply("WEB_SEARCH, maybe DOCUMENT_SEARCH"),
            Intent::DocumentSearch
        );
    }

    #[test]
    fn unparseable_reply_defaults_to_web_search() {
        assert_eq!(parse_intent_reply(""), Intent::WebSearch);
        assert_eq!(parse_intent_reply("I'm not sure."), Intent::WebSearch);
    }

    #[test]
    fn prompt_embeds_request_text() {
        let request = Request::new("How do I reset my password?").unwrap();
        let llm_request = LlmClassifier::build_request(&request);
        let prompt = &llm_request.messages[0].content;
        assert!(prompt.contains("TICKET, DOCUMENT_SEARCH, WEB_SEARCH"));
        assert!(prompt.ends_with("User Request: How do I reset my password?"));
        assert_eq!(llm_request.temperature, Some(0.0));
    }
}
