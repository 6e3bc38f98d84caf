use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

use crate::llm::{ChatModel, Embedder, ToolSchema};
use crate::search::{NodeHit, VectorIndex};

pub const WIKIPEDIA_TOOL_NAME: &str = "wikipedia_search";
pub const WIKIPEDIA_TOOL_DESCRIPTION: &str =
    "Useful for when you need to answer questions about Wikipedia.";

/// Returned when nothing in the index matches.
pub const EMPTY_RESPONSE: &str = "Empty Response";

/// A tool the agent can invoke with a single string input.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    async fn call(&self, input: &str) -> Result<String>;

    fn name(&self) -> String {
        self.schema().name
    }
}

/// How retrieved chunks are turned into a tool answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// All chunks in one prompt.
    #[default]
    Compact,
    /// Answer from the first chunk, then refine once per further chunk.
    Refine,
    /// Raw chunk text, no LLM call.
    NoText,
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown response mode: {0} (expected compact, refine or no_text)")]
pub struct UnknownResponseMode(String);

impl FromStr for ResponseMode {
    type Err = UnknownResponseMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "refine" => Ok(Self::Refine),
            "no_text" => Ok(Self::NoText),
            other => Err(UnknownResponseMode(other.to_string())),
        }
    }
}

/// Similarity search over a session's [`VectorIndex`], answered by the LLM.
pub struct WikipediaTool {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    similarity_top_k: usize,
    response_mode: ResponseMode,
}

impl WikipediaTool {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        similarity_top_k: usize,
        response_mode: ResponseMode,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            similarity_top_k,
            response_mode,
        }
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<NodeHit>> {
        let embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .context("No embedding returned for query")?;
        Ok(self.index.search(&embedding, self.similarity_top_k))
    }

    async fn synthesize(&self, query: &str, hits: &[NodeHit]) -> Result<String> {
        match self.response_mode {
            ResponseMode::NoText => Ok(hits
                .iter()
                .map(format_hit)
                .collect::<Vec<_>>()
                .join("\n\n")),
            ResponseMode::Compact => {
                let context = hits.iter().map(format_hit).collect::<Vec<_>>().join("\n\n");
                self.llm.complete(&qa_prompt(&context, query)).await
            }
            ResponseMode::Refine => {
                let mut answer = String::new();
                for (i, hit) in hits.iter().enumerate() {
                    let prompt = if i == 0 {
                        qa_prompt(&format_hit(hit), query)
                    } else {
                        refine_prompt(query, &answer, &format_hit(hit))
                    };
                    answer = self.llm.complete(&prompt).await?;
                }
                Ok(answer)
            }
        }
    }
}

#[async_trait]
impl AgentTool for WikipediaTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: WIKIPEDIA_TOOL_NAME.to_string(),
            description: WIKIPEDIA_TOOL_DESCRIPTION.to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "Question to look up in the fetched Wikipedia pages"
                    }
                },
                "required": ["input"]
            }),
        }
    }

    async fn call(&self, input: &str) -> Result<String> {
        let hits = self.retrieve(input).await?;
        tracing::debug!(
            hits = hits.len(),
            nodes = ?hits
                .iter()
                .map(|h| format!("{}#{} ({})", h.source_title, h.chunk_index, h.node_id))
                .collect::<Vec<_>>(),
            "wikipedia_search retrieved nodes"
        );

        if hits.is_empty() {
            return Ok(EMPTY_RESPONSE.to_string());
        }
        self.synthesize(input, &hits).await
    }
}

fn format_hit(hit: &NodeHit) -> String {
    format!("Source: {} ({})\n{}", hit.source_title, hit.source_url, hit.text)
}

fn qa_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}

fn refine_prompt(query: &str, existing_answer: &str, context: &str) -> String {
    format!(
        "The original query is as follows: {query}\n\
         We have provided an existing answer: {existing_answer}\n\
         We have the opportunity to refine the existing answer (only if needed) with some more \
         context below.\n\
         ------------\n\
         {context}\n\
         ------------\n\
         Given the new context, refine the original answer to better answer the query. If the \
         context isn't useful, return the original answer.\n\
         Refined Answer: "
    )
}
