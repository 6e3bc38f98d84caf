use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the course table is persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Wikipedia API configuration
    pub wikipedia: WikipediaConfig,
    /// Retrieval pipeline tuning
    pub rag: RagConfig,
    /// Reuse one agent session across every chat request
    pub shared_chat_session: bool,
    /// Maximum concurrent chat pipeline runs
    pub max_concurrent_chats: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for chat, title extraction and the agent
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of texts sent per embedding request
    pub embed_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// MediaWiki action API endpoint
    pub api_url: String,
    /// Resolve each title through a search call before fetching
    pub resolve_titles: bool,
    /// Sent as the User-Agent header, which Wikimedia requires
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunk size in tokens
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in tokens
    pub chunk_overlap: usize,
    /// Number of chunks the retrieval tool pulls per call
    pub similarity_top_k: usize,
    /// "compact", "refine" or "no_text"
    pub response_mode: String,
    /// Upper bound on agent tool-call rounds
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            llm: LlmConfig::default(),
            wikipedia: WikipediaConfig::default(),
            rag: RagConfig::default(),
            shared_chat_session: false,
            max_concurrent_chats: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 60,
            embed_batch_size: 100,
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            resolve_titles: false,
            user_agent: concat!("wiki-assistant/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 150,
            chunk_overlap: 40,
            similarity_top_k: 5,
            response_mode: "compact".to_string(),
            max_iterations: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("WIKI_ASSISTANT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("WIKI_ASSISTANT_BIND_ADDR") {
            config.bind_addr = addr;
        }

        // LLM
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Some(v) = parse_env("LLM_TEMPERATURE") {
            config.llm.temperature = v;
        }
        if let Some(v) = parse_env("LLM_MAX_TOKENS") {
            config.llm.max_tokens = v;
        }
        if let Some(v) = parse_env("LLM_TIMEOUT_SECS") {
            config.llm.timeout_secs = v;
        }
        if let Some(v) = parse_env::<usize>("LLM_EMBED_BATCH_SIZE") {
            config.llm.embed_batch_size = v.max(1);
        }

        // Wikipedia
        if let Ok(url) = std::env::var("WIKIPEDIA_API_URL") {
            config.wikipedia.api_url = url;
        }
        if let Some(v) = parse_env("WIKIPEDIA_RESOLVE_TITLES") {
            config.wikipedia.resolve_titles = v;
        }

        // Retrieval pipeline
        if let Some(v) = parse_env("RAG_CHUNK_SIZE") {
            config.rag.chunk_size = v;
        }
        if let Some(v) = parse_env("RAG_CHUNK_OVERLAP") {
            config.rag.chunk_overlap = v;
        }
        if let Some(v) = parse_env("RAG_SIMILARITY_TOP_K") {
            config.rag.similarity_top_k = v;
        }
        if let Ok(mode) = std::env::var("RAG_RESPONSE_MODE") {
            config.rag.response_mode = mode;
        }
        if let Some(v) = parse_env("RAG_MAX_ITERATIONS") {
            config.rag.max_iterations = v;
        }

        if let Some(v) = parse_env("WIKI_CHAT_SHARED_SESSION") {
            config.shared_chat_session = v;
        }
        if let Some(v) = parse_env::<usize>("WIKI_CHAT_MAX_CONCURRENT") {
            config.max_concurrent_chats = v.max(1);
        }

        config
    }

    pub fn courses_path(&self) -> PathBuf {
        self.data_dir.join("courses.json")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
