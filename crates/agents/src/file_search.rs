//! Document search agent - answers from the internal knowledge repository.

use std::sync::Arc;

use async_trait::async_trait;
use switchboard_common::{Adapter, AdapterResult, Backend, Request, Result, SwitchboardError};
use switchboard_llm::{HostedTool, LlmClient, LlmRequest};
use tracing::{debug, info};

/// Repository searched when none is configured.
pub const DEFAULT_VECTOR_STORE_ID: &str = "vs_689ca12932cc8191a0223ebc3a1d6116";

pub const DEFAULT_MAX_RESULTS: u32 = 3;

const FILE_SEARCH_INSTRUCTIONS: &str = r#"You are a specialised File Search Agent for a UK audience.

POLICY:
1) Use the file search tool to search the knowledge repository
2) Only answer from the returned snippets - never invent information
3) If you cite, paraphrase neatly and be concise
4) If the repository lacks the answer, clearly state "Not found in repository."
5) Write in UK English (spelling, tone). Be clear and polite.
6) Focus on providing accurate, repository-based information
"#;

pub struct DocumentSearchAgent {
    llm: Arc<dyn LlmClient>,
    vector_store_ids: Vec<String>,
    max_num_results: u32,
}

impl DocumentSearchAgent {
    pub fn new(llm: Arc<dyn LlmClient>, vector_store_ids: Vec<String>) -> Self {
        Self {
            llm,
            vector_store_ids,
            max_num_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_num_results: u32) -> Self {
        self.max_num_results = max_num_results.max(1);
        self
    }

    pub fn vector_store_ids(&self) -> &[String] {
        &self.vector_store_ids
    }

    fn build_request(&self, request: &Request) -> LlmRequest {
        LlmRequest::prompt(format!(
            "{FILE_SEARCH_INSTRUCTIONS}\nQuestion: {}",
            request.text
        ))
        .with_tool(HostedTool::FileSearch {
            vector_store_ids: self.vector_store_ids.clone(),
            max_num_results: self.max_num_results,
        })
    }

    /// Map a raw search reply onto found / not found.
    ///
    /// Any mention of "not found" counts as a miss, so borderline replies
    /// go to the web fallback rather than being shown as an answer.
    pub fn normalize_reply(reply: &str) -> AdapterResult {
        let trimmed = reply.trim();
        if trimmed.is_empty() || trimmed.to_lowercase().contains("not found") {
            return AdapterResult::not_found();
        }
        AdapterResult::found(trimmed)
    }
}

#[async_trait]
impl Adapter for DocumentSearchAgent {
    fn backend(&self) -> Backend {
        Backend::DocumentSearch
    }

    async fn invoke(&self, request: &Request) -> Result<AdapterResult> {
        let backend = self.backend().name();
        if self.vector_store_ids.is_empty() {
            return Err(SwitchboardError::adapter(
                backend,
                "no document repository configured",
            ));
        }

        info!(
            request_id = %request.id,
            stores = self.vector_store_ids.len(),
            "Searching document repository"
        );

        let response = self
            .llm
            .complete(self.build_request(request))
            .await
            .map_err(|e| SwitchboardError::adapter(backend, e))?;

        let result = Self::normalize_reply(&response.content);
        debug!(request_id = %request.id, found = result.is_found(), "Document search finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_common::NOT_FOUND_SENTINEL;

    #[test]
    fn sentinel_reply_is_not_found() {
        let result = DocumentSearchAgent::normalize_reply("Not found in repository.");
        assert!(!result.is_found());
        assert_eq!(result.text, NOT_FOUND_SENTINEL);
    }

    #[test]
    fn lowercase_phrase_is_not_found() {
        let result =
            DocumentSearchAgent::normalize_reply("Sorry, that policy was not found in the files.");
        assert_eq!(result.found, Some(false));
    }

    #[test]
    fn blank_reply_is_not_found() {
        assert!(!DocumentSearchAgent::normalize_reply("  \n ").is_found());
    }

    #[test]
    fn answer_is_trimmed_and_found() {
        let result = DocumentSearchAgent::normalize_reply("\n Open Settings > Accounts. \n");
        assert!(result.is_found());
        assert_eq!(result.text, "Open Settings > Accounts.");
    }
}
