//! Lazily built Wikipedia RAG session.
//!
//! ```text
//! query ─▶ extract titles ─▶ fetch pages ─▶ chunk + embed ─▶ tool ─▶ agent
//!                                                                      │
//! later queries ───────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline runs on the first query of a [`WikipediaRagService`]. Once the
//! agent exists every further query goes straight to it, whatever the query
//! is about.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::agent::{AgentError, AgentService, ResponseMode};
use crate::chunking::SentenceSplitter;
use crate::config::Config;
use crate::llm::title_extract::LlmTitleExtractor;
use crate::llm::{ChatModel, Embedder, LlmClient};
use crate::models::Document;
use crate::search::VectorIndexingService;
use crate::wikipedia::WikipediaClient;

pub const PROCESSING_FAILED_RESPONSE: &str = "I'm sorry, I couldn't process your query. This might be because:
1. There are no relevant Wikipedia pages for the given query.
2. The Wikipedia content is not sufficient to answer the query.
Please try again with a more specific query.";

pub const UNEXPECTED_ERROR_RESPONSE: &str = "An unexpected error occurred. Please try again later.";

#[async_trait]
pub trait TitleExtractor: Send + Sync {
    /// Wikipedia page titles relevant to `query`. Failures yield an empty list.
    async fn extract_titles(&self, query: &str) -> Vec<String>;
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// One document per page found. Failures yield an empty list.
    async fn fetch_content(&self, titles: &[String]) -> Vec<Document>;
}

#[derive(Debug, Error)]
pub enum RagError {
    #[error("No relevant Wikipedia pages found for the given user query. Please provide a more specific query.")]
    NoTitles,
    #[error("Failed to fetch content from Wikipedia. The pages might not exist or might be private.")]
    NoDocuments,
    #[error("Failed to create vector index from the fetched Wikipedia content. The content might be invalid or insufficient.")]
    NoIndex,
    #[error("Error creating Wikipedia RAG agent: {0}")]
    CreateAgent(#[source] Box<RagError>),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl RagError {
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Agent(e) => e.is_unexpected(),
            Self::CreateAgent(inner) => inner.is_unexpected(),
            _ => false,
        }
    }
}

/// Everything a [`WikipediaRagService`] is assembled from.
pub struct RagComponents {
    pub title_extractor: Arc<dyn TitleExtractor>,
    pub content_fetcher: Arc<dyn ContentFetcher>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn ChatModel>,
    pub splitter: SentenceSplitter,
    pub similarity_top_k: usize,
    pub response_mode: ResponseMode,
    pub max_iterations: usize,
}

pub struct WikipediaRagService {
    title_extractor: Arc<dyn TitleExtractor>,
    content_fetcher: Arc<dyn ContentFetcher>,
    vector_indexer: VectorIndexingService,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    agent_service: AgentService,
    similarity_top_k: usize,
    response_mode: ResponseMode,
    is_agent_initialized: bool,
}

impl WikipediaRagService {
    pub fn new(components: RagComponents) -> Self {
        let RagComponents {
            title_extractor,
            content_fetcher,
            embedder,
            llm,
            splitter,
            similarity_top_k,
            response_mode,
            max_iterations,
        } = components;

        Self {
            title_extractor,
            content_fetcher,
            vector_indexer: VectorIndexingService::new(splitter, embedder.clone()),
            agent_service: AgentService::new(llm.clone(), max_iterations),
            embedder,
            llm,
            similarity_top_k,
            response_mode,
            is_agent_initialized: false,
        }
    }

    /// Wire the production components from configuration. Fails when the LLM
    /// provider is misconfigured or the chunking/response settings are invalid.
    pub fn from_config(http: reqwest::Client, config: &Config) -> anyhow::Result<Self> {
        let llm = Arc::new(LlmClient::new(http.clone(), config.llm.clone())?);
        let splitter = SentenceSplitter::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
        let response_mode: ResponseMode = config.rag.response_mode.parse()?;

        Ok(Self::new(RagComponents {
            title_extractor: Arc::new(LlmTitleExtractor::new(llm.clone())),
            content_fetcher: Arc::new(WikipediaClient::new(http, config.wikipedia.clone())),
            embedder: llm.clone(),
            llm,
            splitter,
            similarity_top_k: config.rag.similarity_top_k,
            response_mode,
            max_iterations: config.rag.max_iterations,
        }))
    }

    pub fn is_agent_initialized(&self) -> bool {
        self.is_agent_initialized
    }

    /// Run the full pipeline for `user_query` and build the agent.
    pub async fn create_agent(&mut self, user_query: &str) -> Result<(), RagError> {
        tracing::info!("Creating Wikipedia RAG agent");

        self.build_agent(user_query).await.map_err(|e| {
            tracing::error!("Error creating Wikipedia RAG agent: {e}");
            RagError::CreateAgent(Box::new(e))
        })
    }

    async fn build_agent(&mut self, user_query: &str) -> Result<(), RagError> {
        let titles = self.title_extractor.extract_titles(user_query).await;
        if titles.is_empty() {
            return Err(RagError::NoTitles);
        }

        let documents = self.content_fetcher.fetch_content(&titles).await;
        if documents.is_empty() {
            return Err(RagError::NoDocuments);
        }

        let index = self
            .vector_indexer
            .create_index_from_documents(&documents)
            .await
            .ok_or(RagError::NoIndex)?;

        let tool = AgentService::create_wikipedia_tool(
            Arc::new(index),
            self.embedder.clone(),
            self.llm.clone(),
            self.similarity_top_k,
            self.response_mode,
        );
        self.agent_service.initialize_agent(vec![tool]);
        self.is_agent_initialized = true;

        tracing::info!("Wikipedia RAG agent ready");
        Ok(())
    }

    /// Answer `user_query`, building the agent first if needed. Never fails:
    /// errors become one of the canned responses.
    pub async fn query(&mut self, user_query: &str) -> String {
        match self.try_query(user_query).await {
            Ok(response) => response,
            Err(e) if e.is_unexpected() => {
                tracing::error!("Unexpected error: {e}");
                UNEXPECTED_ERROR_RESPONSE.to_string()
            }
            Err(e) => {
                tracing::error!("Query processing failed: {e}");
                PROCESSING_FAILED_RESPONSE.to_string()
            }
        }
    }

    async fn try_query(&mut self, user_query: &str) -> Result<String, RagError> {
        if !self.is_agent_initialized {
            self.create_agent(user_query).await?;
        }
        Ok(self.agent_service.query(user_query).await?)
    }
}

/// Builds a fresh [`WikipediaRagService`] for a chat session.
pub type RagServiceFactory =
    Arc<dyn Fn() -> anyhow::Result<WikipediaRagService> + Send + Sync>;

/// Decides how long an agent session lives: one per request, or one shared
/// by every request.
pub struct ChatSessions {
    factory: RagServiceFactory,
    shared: Option<tokio::sync::Mutex<Option<WikipediaRagService>>>,
}

impl ChatSessions {
    pub fn new(factory: RagServiceFactory, shared_session: bool) -> Self {
        Self {
            factory,
            shared: shared_session.then(|| tokio::sync::Mutex::new(None)),
        }
    }

    /// Production sessions built from `config`.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        let cfg = config.clone();
        let factory: RagServiceFactory =
            Arc::new(move || WikipediaRagService::from_config(http.clone(), &cfg));
        Self::new(factory, config.shared_chat_session)
    }

    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Fails only when a service cannot be constructed.
    pub async fn query(&self, user_query: &str) -> anyhow::Result<String> {
        let Some(slot) = &self.shared else {
            let mut service = (self.factory)()?;
            return Ok(service.query(user_query).await);
        };

        // Held across the pipeline so concurrent requests queue behind it.
        // The service stays in the slot, so a cancelled request keeps the agent.
        let mut guard = slot.lock().await;
        let service = match &mut *guard {
            Some(service) => service,
            empty => empty.insert((self.factory)()?),
        };
        Ok(service.query(user_query).await)
    }
}
