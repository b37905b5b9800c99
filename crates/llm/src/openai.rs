use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_common::{Result, SwitchboardError};

use crate::client::{transport_error, HostedTool, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// Responses API, used whenever hosted tools are attached.

#[derive(Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    tools: Vec<ResponsesTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponsesTool {
    WebSearchPreview,
    FileSearch {
        vector_store_ids: Vec<String>,
        max_num_results: u32,
    },
}

impl From<&HostedTool> for ResponsesTool {
    fn from(tool: &HostedTool) -> Self {
        match tool {
            HostedTool::WebSearch => ResponsesTool::WebSearchPreview,
            HostedTool::FileSearch {
                vector_store_ids,
                max_num_results,
            } => ResponsesTool::FileSearch {
                vector_store_ids: vector_store_ids.clone(),
                max_num_results: *max_num_results,
            },
        }
    }
}

#[derive(Deserialize)]
struct ResponsesResponse {
    model: String,
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
    usage: Option<ResponsesUsage>,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponsesOutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<ResponsesContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponsesContent {
    #[serde(rename = "output_text")]
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ResponsesResponse {
    /// Concatenate every text part of every assistant message.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                ResponsesOutputItem::Message { content } => Some(content),
                ResponsesOutputItem::Other => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ResponsesContent::OutputText { text } => Some(text.as_str()),
                ResponsesContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_ms: u64,
    default_temperature: Option<f32>,
    default_max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, model: String, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            api_key,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_temperature: None,
            default_max_tokens: None,
            http_client: build_http_client(DEFAULT_TIMEOUT_MS)?,
        })
    }

    /// Bound every call to `timeout_ms`.
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
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_messages(request: &LlmRequest) -> Vec<OpenAiMessage> {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system_prompt {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        for msg in &request.messages {
            messages.push(OpenAiMessage {
                role: Self::role_to_string(&msg.role).to_string(),
                content: msg.content.clone(),
            });
        }
        messages
    }

    fn build_request_body(&self, request: &LlmRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            temperature: request.temperature.or(self.default_temperature),
            max_tokens: request.max_tokens.or(self.default_max_tokens),
        }
    }

    fn build_responses_body(&self, request: &LlmRequest) -> ResponsesRequest {
        ResponsesRequest {
            model: self.model.clone(),
            input: request
                .messages
                .iter()
                .map(|msg| OpenAiMessage {
                    role: Self::role_to_string(&msg.role).to_string(),
                    content: msg.content.clone(),
                })
                .collect(),
            instructions: request.system_prompt.clone(),
            tools: request.tools.iter().map(ResponsesTool::from).collect(),
            temperature: request.temperature.or(self.default_temperature),
            max_output_tokens: request.max_tokens.or(self.default_max_tokens),
        }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);

        let mut http_req = self.http_client.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| transport_error("OpenAI", self.timeout_ms, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(|v| format!(", Retry-After: {v}"))
                .unwrap_or_default();
            let body_text = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Provider(format!(
                "OpenAI API error {status}: {body_text}{retry_after}"
            )));
        }

        Ok(response)
    }

    async fn complete_chat(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = self.build_request_body(request);
        let response = self.post("/v1/chat/completions", &body).await?;

        let oai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| SwitchboardError::Provider(format!("Failed to parse OpenAI response: {e}")))?;

        let choice = oai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SwitchboardError::Provider("No choices in OpenAI response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content,
            model: oai_response.model,
            usage: oai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn complete_with_tools(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = self.build_responses_body(request);
        let response = self.post("/v1/responses", &body).await?;

        let parsed: ResponsesResponse = response.json().await.map_err(|e| {
            SwitchboardError::Provider(format!("Failed to parse OpenAI Responses payload: {e}"))
        })?;

        if parsed.status.as_deref() == Some("failed") {
            return Err(SwitchboardError::Provider(
                "OpenAI response finished with status 'failed'".to_string(),
            ));
        }

        Ok(LlmResponse {
            content: parsed.output_text(),
            model: parsed.model.clone(),
            usage: parsed.usage.as_ref().map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
            finish_reason: parsed.status.clone(),
        })
    }
}

fn build_http_client(timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| SwitchboardError::Config(format!("Failed to build OpenAI HTTP client: {e}")))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        if request.tools.is_empty() {
            self.complete_chat(&request).await
        } else {
            self.complete_with_tools(&request).await
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
