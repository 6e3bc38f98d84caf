use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatResponse, ToolCall, ToolSchema};
use crate::config::LlmConfig;

/// Non-streaming chat completion with optional function calling.
pub async fn chat_completion(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
    tools: &[ToolSchema],
) -> Result<ChatResponse> {
    match config.provider.as_str() {
        "openai" => chat_openai(client, config, messages, tools).await,
        "ollama" => chat_ollama(client, config, messages, tools).await,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    }
}

/// Tool declaration shared by both wire formats.
#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSchema,
}

fn wire_tools(tools: &[ToolSchema]) -> Vec<WireTool<'_>> {
    tools
        .iter()
        .map(|t| WireTool {
            kind: "function",
            function: t,
        })
        .collect()
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

fn to_openai_message(m: &ChatMessage) -> OpenAiMessage {
    let tool_calls = (!m.tool_calls.is_empty()).then(|| {
        m.tool_calls
            .iter()
            .map(|tc| OpenAiToolCall {
                id: tc.id.clone(),
                kind: function_kind(),
                function: OpenAiFunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.arguments.clone(),
                },
            })
            .collect()
    });
    OpenAiMessage {
        role: m.role.clone(),
        // Assistant tool-call turns carry null content
        content: if tool_calls.is_some() && m.content.is_empty() {
            None
        } else {
            Some(m.content.clone())
        },
        tool_calls,
        tool_call_id: m.tool_call_id.clone(),
    }
}

fn parse_openai_response(body: OpenAiChatResponse) -> Result<ChatResponse> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .context("OpenAI response contained no choices")?;

    match message.tool_calls {
        Some(calls) if !calls.is_empty() => Ok(ChatResponse::ToolCalls(
            calls
                .into_iter()
                .map(|c| ToolCall {
                    id: c.id,
                    name: c.function.name,
                    arguments: c.function.arguments,
                })
                .collect(),
        )),
        _ => Ok(ChatResponse::Content(message.content.unwrap_or_default())),
    }
}

async fn chat_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
    tools: &[ToolSchema],
) -> Result<ChatResponse> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: &config.chat_model,
        messages: messages.iter().map(to_openai_message).collect(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        tools: wire_tools(tools),
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI chat response")?;
    parse_openai_response(body)
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

/// Ollama sends and expects arguments as a JSON object, not a string.
#[derive(Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

fn to_ollama_message(m: &ChatMessage) -> OllamaMessage {
    OllamaMessage {
        role: m.role.clone(),
        content: m.content.clone(),
        tool_calls: m
            .tool_calls
            .iter()
            .map(|tc| OllamaToolCall {
                function: OllamaFunctionCall {
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments)
                        .unwrap_or_else(|_| serde_json::json!({})),
                },
            })
            .collect(),
    }
}

fn parse_ollama_response(body: OllamaChatResponse) -> ChatResponse {
    if body.message.tool_calls.is_empty() {
        return ChatResponse::Content(body.message.content);
    }
    // Ollama does not assign call ids
    ChatResponse::ToolCalls(
        body.message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, c)| ToolCall {
                id: format!("call_{i}"),
                name: c.function.name,
                arguments: c.function.arguments.to_string(),
            })
            .collect(),
    )
}

async fn chat_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
    tools: &[ToolSchema],
) -> Result<ChatResponse> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: &config.chat_model,
        messages: messages.iter().map(to_ollama_message).collect(),
        stream: false,
        options: OllamaOptions {
            temperature: config.temperature,
            num_predict: config.max_tokens,
        },
        tools: wire_tools(tools),
    };

    let resp = client
        .post(&url)
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama chat response")?;
    Ok(parse_ollama_response(body))
}
