//! Web search agent - current information from the public web.

use std::sync::Arc;

use async_trait::async_trait;
use switchboard_common::{Adapter, AdapterResult, Backend, Request, Result, SwitchboardError};
use switchboard_llm::{HostedTool, LlmClient, LlmRequest};
use tracing::info;

const WEB_SEARCH_INSTRUCTIONS: &str = r#"You are a specialised Web Search Agent for a UK audience.

POLICY:
1) Use the web search tool to find current information from the web
2) Always clearly state that you used web search before providing information
3) Provide concise, relevant answers based on web search results
4) Cite sources when possible
5) Write in UK English (spelling, tone). Be clear and polite.
6) If no relevant information is found, clearly state this
"#;

pub struct WebSearchAgent {
    llm: Arc<dyn LlmClient>,
}

impl WebSearchAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn build_request(request: &Request) -> LlmRequest {
        LlmRequest::prompt(format!(
            "{WEB_SEARCH_INSTRUCTIONS}\nQuestion: {}",
            request.text
        ))
        .with_tool(HostedTool::WebSearch)
    }
}

#[async_trait]
impl Adapter for WebSearchAgent {
    fn backend(&self) -> Backend {
        Backend::WebSearch
    }

    async fn invoke(&self, request: &Request) -> Result<AdapterResult> {
        info!(request_id = %request.id, "Searching the web");

        let response = self
            .llm
            .complete(Self::build_request(request))
            .await
            .map_err(|e| SwitchboardError::adapter(self.backend().name(), e))?;

        Ok(AdapterResult::text(response.content.trim()))
    }
}
