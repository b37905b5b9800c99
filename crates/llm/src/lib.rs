pub mod anthropic;
pub mod client;
pub mod config;
pub mod openai;
pub mod retry;

pub use anthropic::AnthropicClient;
pub use client::{ChatMessage, HostedTool, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};
pub use config::{build_llm_client, LlmConfig, SemaphoredClient};
pub use openai::{OpenAiClient, DEFAULT_BASE_URL};
pub use retry::{RetryConfig, RetryingClient};
