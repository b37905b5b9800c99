use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_common::{Result, SwitchboardError};

use crate::client::{transport_error, HostedTool, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Serialize, Debug, Clone)]
struct AnthropicTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    name: &'static str,
    max_uses: u32,
}

#[derive(Serialize, Debug, Clone)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContent>,
}

#[derive(Serialize, Debug, Clone)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
    model: String,
    usage: Option<AnthropicUsage>,
    stop_reason: Option<String>,
}

/// Response blocks; server tool calls and their results are skipped.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum AnthropicBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicClient {
    base_url: String,
    model: String,
    api_key: String,
    timeout_ms: u64,
    default_temperature: Option<f32>,
    default_max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(model: String, api_key: String) -> Result<Self> {
        Ok(Self {
            base_url: ANTHROPIC_API_URL.to_string(),
            model,
            api_key,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_temperature: None,
            default_max_tokens: None,
            http_client: build_http_client(DEFAULT_TIMEOUT_MS)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Result<Self> {
        self.timeout_ms = timeout_ms;
        self.http_client = build_http_client(timeout_ms)?;
        Ok(self)
    }

    /// Sampling values used when a request leaves them unset.
    pub fn with_sampling_defaults(
        mut self,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Self {
        self.default_temperature = temperature;
        self.default_max_tokens = max_tokens;
        self
    }

    fn role_to_string(role: &Role) -> &'static str {
        match role {
            Role::System => "user", // system messages go in the top-level system field
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_messages(request: &LlmRequest) -> Vec<AnthropicMessage> {
        request
            .messages
            .iter()
            .filter(|msg| msg.role != Role::System)
            .map(|msg| AnthropicMessage {
                role: Self::role_to_string(&msg.role).to_string(),
                content: vec![AnthropicContent {
                    content_type: "text".to_string(),
                    text: msg.content.clone(),
                }],
            })
            .collect()
    }

    fn build_tools(request: &LlmRequest) -> Result<Vec<AnthropicTool>> {
        request
            .tools
            .iter()
            .map(|tool| match tool {
                HostedTool::WebSearch => Ok(AnthropicTool {
                    tool_type: WEB_SEARCH_TOOL_TYPE,
                    name: "web_search",
                    max_uses: 5,
                }),
                HostedTool::FileSearch { .. } => Err(SwitchboardError::Config(
                    "file search over vector stores requires the openai provider".to_string(),
                )),
            })
            .collect()
    }

    fn build_request_body(&self, request: &LlmRequest) -> Result<AnthropicRequest> {
        Ok(AnthropicRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            system: request.system_prompt.clone(),
            temperature: request.temperature.or(self.default_temperature),
            max_tokens: request
                .max_tokens
                .or(self.default_max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            tools: Self::build_tools(request)?,
        })
    }
}

fn build_http_client(timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| SwitchboardError::Config(format!("Failed to build Anthropic HTTP client: {e}")))
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.build_request_body(&request)?;

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("Anthropic", self.timeout_ms, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Provider(format!(
                "Anthropic API error {status}: {body_text}"
            )));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            SwitchboardError::Provider(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content = anthropic_response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicBlock::Text { text } => Some(text),
                AnthropicBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse {
            content,
            model: anthropic_response.model,
            usage: anthropic_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
            finish_reason: anthropic_response.stop_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[test]
    fn request_body_matches_anthropic_format() {
        let client = AnthropicClient::new(
            "claude-sonnet-4-20250514".to_string(),
            "sk-ant-test".to_string(),
        ).unwrap();
        let request = LlmRequest {
            system_prompt: Some("Be helpful.".to_string()),
            messages: vec![
                ChatMessage {
                    role: Role::User,
                    content: "Hello".to_string(),
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: "Hi there!".to_string(),
                },
            ],
            temperature: Some(0.7),
            max_tokens: Some(1024),
            tools: vec![],
        };

        let body = client.build_request_body(&request).unwrap();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["system"], "Be helpful.");
        assert_eq!(json["max_tokens"], 1024);
        assert!(json.get("tools").is_none());

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"][0]["type"], "text");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[test]
    fn web_search_tool_is_forwarded() {
        let client = AnthropicClient::new("claude".into(), "key".into()).unwrap();
        let request = LlmRequest::prompt("news").with_tool(HostedTool::WebSearch);

        let json = serde_json::to_value(client.build_request_body(&request).unwrap()).unwrap();
        assert_eq!(json["tools"][0]["type"], WEB_SEARCH_TOOL_TYPE);
        assert_eq!(json["tools"][0]["name"], "web_search");
    }

    #[test]
    fn file_search_is_rejected() {
        let client = AnthropicClient::new("claude".into(), "key".into()).unwrap();
        let request = LlmRequest::prompt("policy").with_tool(HostedTool::FileSearch {
            vector_store_ids: vec!["vs_1".into()],
            max_num_results: 3,
        });

        assert!(matches!(
            client.build_request_body(&request),
            Err(SwitchboardError::Config(_))
        ));
    }

    #[test]
    fn server_tool_blocks_are_ignored() {
        let payload = serde_json::json!({
            "model": "claude",
            "stop_reason": "end_turn",
            "content": [
                {"type": "server_tool_use", "id": "srvtoolu_1", "name": "web_search", "input": {"query": "q"}},
                {"type": "web_search_tool_result", "tool_use_id": "srvtoolu_1", "content": []},
                {"type": "text", "text": "Answer."}
            ]
        });
        let parsed: AnthropicResponse = serde_json::from_value(payload).unwrap();
        let texts: Vec<_> = parsed
            .content
            .into_iter()
            .filter_map(|b| match b {
                AnthropicBlock::Text { text } => Some(text),
                AnthropicBlock::Other => None,
            })
            .collect();
        assert_eq!(texts, vec!["Answer.".to_string()]);
    }

    #[test]
    fn default_max_tokens_when_none() {
        let client =
            AnthropicClient::new("claude-sonnet-4-20250514".to_string(), "key".to_string()).unwrap();
        let body = client.build_request_body(&LlmRequest::prompt("Hello")).unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 4096);
    }

    #[test]
    fn sampling_defaults_fill_unset_fields() {
        let client = AnthropicClient::new("claude".into(), "key".into())
            .unwrap()
            .with_sampling_defaults(Some(0.2), Some(256));

        let json =
            serde_json::to_value(client.build_request_body(&LlmRequest::prompt("hi")).unwrap()).unwrap();
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert_eq!(json["max_tokens"], 256);

        let explicit = LlmRequest {
            temperature: Some(0.0),
            ..LlmRequest::prompt("hi")
        };
        let json = serde_json::to_value(client.build_request_body(&explicit).unwrap()).unwrap();
        assert_eq!(json["temperature"], 0.0);
    }
}
