//! The Wikipedia agent: a retrieval tool over the session index and a
//! bounded tool-calling loop around it.

pub mod react;
pub mod tool;

use std::sync::Arc;

pub use react::{AgentError, ReActAgent};
pub use tool::{AgentTool, ResponseMode, WikipediaTool};

use crate::llm::{ChatModel, Embedder};
use crate::search::VectorIndex;

/// Answer for a blank query.
pub const EMPTY_QUERY_RESPONSE: &str = "I need a question to help you. Please ask me something.";

pub const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant with access to Wikipedia information.

Your role is to:
1. Understand user questions and determine if you need to search for information
2. Use the wikipedia_search tool when you need factual information
3. Provide accurate, helpful responses based on the retrieved information
4. Cite your sources when providing information from Wikipedia
5. If you cannot find relevant information, clearly state that

Guidelines:
- Always use the tool when you need to look up factual information
- Be concise but comprehensive in your responses
- If the retrieved information doesn't fully answer the question, say so
- Provide context and explanations, not just raw facts
- If asked about recent events beyond your knowledge, acknowledge limitations

Remember: You have access to Wikipedia content through the search tool. Use it wisely!";

/// Holds the agent once tools are available.
pub struct AgentService {
    llm: Arc<dyn ChatModel>,
    max_iterations: usize,
    agent: Option<ReActAgent>,
}

impl AgentService {
    pub fn new(llm: Arc<dyn ChatModel>, max_iterations: usize) -> Self {
        Self {
            llm,
            max_iterations,
            agent: None,
        }
    }

    pub fn initialize_agent(&mut self, tools: Vec<Arc<dyn AgentTool>>) {
        tracing::info!("Initializing ReAct agent with {} tools", tools.len());
        self.agent = Some(ReActAgent::new(
            self.llm.clone(),
            tools,
            SYSTEM_PROMPT,
            self.max_iterations,
        ));
    }

    pub fn is_initialized(&self) -> bool {
        self.agent.is_some()
    }

    pub async fn query(&self, user_query: &str) -> Result<String, AgentError> {
        let agent = self.agent.as_ref().ok_or(AgentError::NotInitialized)?;

        let user_query = user_query.trim();
        if user_query.is_empty() {
            return Ok(EMPTY_QUERY_RESPONSE.to_string());
        }

        tracing::info!("Querying ReAct agent");
        let response = agent.chat(user_query).await?;
        tracing::info!("ReAct agent queried successfully");
        Ok(response)
    }

    pub fn create_wikipedia_tool(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        similarity_top_k: usize,
        response_mode: ResponseMode,
    ) -> Arc<dyn AgentTool> {
        tracing::info!(
            similarity_top_k,
            ?response_mode,
            "Creating Wikipedia query engine tool"
        );
        Arc::new(WikipediaTool::new(
            index,
            embedder,
            llm,
            similarity_top_k,
            response_mode,
        ))
    }
}
