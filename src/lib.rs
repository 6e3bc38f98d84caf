//! # wiki-assistant
//!
//! A small web service with two halves: a CRUD API over a course table, and
//! a chat endpoint that answers questions from Wikipedia.
//!
//! ## Chat pipeline
//!
//! ```text
//!                   ┌──────────────┐
//!                   │  User Query  │
//!                   └──────┬───────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │  Title Extraction   │
//!               │  (LLM: 5 titles)    │
//!               └──────────┬──────────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │  Wikipedia Fetch    │
//!               │  plain-text extracts│
//!               └──────────┬──────────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │ Sentence Chunking   │
//!               │ 150 tokens / 40 ovl │
//!               └──────────┬──────────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │ In-memory Vector    │
//!               │ Index (embeddings)  │
//!               └──────────┬──────────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │  wikipedia_search   │
//!               │  tool (top-k 5)     │
//!               └──────────┬──────────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │  Tool-calling Agent │
//!               │  ≤ 10 iterations    │
//!               └─────────────────────┘
//! ```
//!
//! The pipeline runs once per session; later queries in the same session go
//! straight to the agent.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, LLM, Wikipedia and retrieval settings
//! - [`models`] - Shared data types: `Course`, payload validation, chat request/response, `Document`
//! - [`store`] - JSON-file backed course table
//! - [`llm`] - Chat completions with tool calling, embeddings, title extraction
//! - [`wikipedia`] - MediaWiki API client
//! - [`chunking`] - Sentence-aligned text splitter
//! - [`search`] - In-memory vector index and the indexing service
//! - [`agent`] - Retrieval tool and tool-calling agent loop
//! - [`rag`] - Lazily built agent session and session scoping
//! - [`api`] - Axum HTTP handlers
//! - [`error`] - HTTP error responses
//! - [`state`] - Shared application state

pub mod agent;
pub mod api;
pub mod chunking;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod rag;
pub mod search;
pub mod state;
pub mod store;
pub mod wikipedia;
