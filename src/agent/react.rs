//! Tool-calling agent loop.
//!
//! Sends the system prompt, the user message and the tool schemas to the
//! model, runs whatever tools it asks for, feeds the results back and loops
//! until the model answers in text.

use std::sync::Arc;

use thiserror::Error;

use super::tool::AgentTool;
use crate::llm::{ChatMessage, ChatModel, ChatResponse, ToolCall, ToolSchema};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("ReAct agent is not initialized")]
    NotInitialized,
    #[error("Reached max iterations ({0}) without a final answer")]
    MaxIterations(usize),
    #[error("Chat model call failed: {0:#}")]
    Llm(anyhow::Error),
}

impl AgentError {
    /// Failures outside the pipeline's control, as opposed to the agent
    /// simply not getting to an answer.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Llm(_))
    }
}

pub struct ReActAgent {
    llm: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn AgentTool>>,
    schemas: Vec<ToolSchema>,
    system_prompt: String,
    max_iterations: usize,
}

impl ReActAgent {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        tools: Vec<Arc<dyn AgentTool>>,
        system_prompt: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        let schemas = tools.iter().map(|t| t.schema()).collect();
        Self {
            llm,
            tools,
            schemas,
            system_prompt: system_prompt.into(),
            max_iterations,
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name.as_str()).collect()
    }

    /// Answer a single user message. Each model round-trip counts as one
    /// iteration.
    pub async fn chat(&self, user_message: &str) -> Result<String, AgentError> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(user_message),
        ];

        for iteration in 1..=self.max_iterations {
            tracing::debug!(iteration, "Agent loop: sending to LLM");

            let response = self
                .llm
                .chat(&messages, &self.schemas)
                .await
                .map_err(AgentError::Llm)?;

            match response {
                ChatResponse::Content(text) => {
                    tracing::debug!(iteration, "Agent loop: LLM returned content, done");
                    return Ok(text);
                }
                ChatResponse::ToolCalls(tool_calls) => {
                    tracing::info!(
                        iteration,
                        tools = ?tool_calls.iter().map(|tc| &tc.name).collect::<Vec<_>>(),
                        "Agent loop: LLM requested tool calls"
                    );

                    messages.push(ChatMessage::assistant_tool_calls(tool_calls.clone()));

                    for tc in &tool_calls {
                        let output = self.execute_tool_call(tc).await;
                        messages.push(ChatMessage::tool_result(&tc.id, output));
                    }
                }
            }
        }

        tracing::warn!(max = self.max_iterations, "Agent loop hit max iterations");
        Err(AgentError::MaxIterations(self.max_iterations))
    }

    /// Run one tool call. Failures become the tool's text output so the
    /// model can recover.
    async fn execute_tool_call(&self, tc: &ToolCall) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == tc.name) else {
            tracing::warn!(tool = %tc.name, "Agent requested unknown tool");
            return format!(
                "Error: unknown tool '{}'. Available tools: {}",
                tc.name,
                self.tool_names().join(", ")
            );
        };

        let input = tool_input(&tc.arguments);
        let start = std::time::Instant::now();
        match tool.call(&input).await {
            Ok(output) => {
                tracing::debug!(
                    tool = %tc.name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call completed"
                );
                output
            }
            Err(e) => {
                tracing::warn!(tool = %tc.name, "Tool execution error: {e:#}");
                format!("Tool execution error: {e}")
            }
        }
    }
}

/// Pull the `input` string out of the raw arguments. Models occasionally send
/// a bare JSON string or plain text instead of the object.
fn tool_input(arguments: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(arguments) {
        Ok(serde_json::Value::Object(map)) => match map.get("input") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => arguments.to_string(),
        },
        Ok(serde_json::Value::String(s)) => s,
        _ => arguments.to_string(),
    }
}
