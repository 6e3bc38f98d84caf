//! LLM provider access: chat completions with tool calling, embeddings, and
//! the title-extraction prompt.
//!
//! Pipeline stages depend on the [`ChatModel`] and [`Embedder`] traits rather
//! than on a provider, so tests can script responses.

pub mod chat;
pub mod embeddings;
pub mod title_extract;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// A single message in a conversation with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on `tool` messages: the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new("assistant", "")
        }
    }

    pub fn tool_result(tool_call_id: &str, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.to_string()),
            ..Self::new("tool", content)
        }
    }
}

/// A tool invocation requested by the model. `arguments` is the raw JSON
/// string the provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Function-calling schema advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// What the model answered: final text, or tools it wants run first.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    Content(String),
    ToolCalls(Vec<ToolCall>),
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> Result<ChatResponse>;

    /// Plain completion without tools.
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.chat(&[ChatMessage::user(prompt)], &[]).await? {
            ChatResponse::Content(text) => Ok(text),
            ChatResponse::ToolCalls(_) => anyhow::bail!("Model requested tools for a plain completion"),
        }
    }
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One embedding per input text, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// HTTP client for the configured provider.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Result<Self> {
        match config.provider.as_str() {
            "openai" => {
                if config.api_key.as_deref().map_or(true, str::is_empty) {
                    anyhow::bail!("LLM_API_KEY (or OPENAI_API_KEY) is required for the openai provider");
                }
            }
            "ollama" => {}
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }
        Ok(Self { http, config })
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> Result<ChatResponse> {
        chat::chat_completion(&self.http, &self.config, messages, tools).await
    }
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        embeddings::embed_batch(&self.http, &self.config, texts).await
    }
}
