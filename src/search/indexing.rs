use std::sync::Arc;

use uuid::Uuid;

use crate::chunking::SentenceSplitter;
use crate::llm::Embedder;
use crate::models::Document;
use crate::search::vector::{Node, VectorIndex};

/// Builds a [`VectorIndex`] from fetched documents.
pub struct VectorIndexingService {
    splitter: SentenceSplitter,
    embedder: Arc<dyn Embedder>,
}

impl VectorIndexingService {
    pub fn new(splitter: SentenceSplitter, embedder: Arc<dyn Embedder>) -> Self {
        Self { splitter, embedder }
    }

    /// Chunk and embed `documents`. Returns `None` for empty input, when no
    /// chunk survives splitting, or when embedding fails.
    pub async fn create_index_from_documents(&self, documents: &[Document]) -> Option<VectorIndex> {
        if documents.is_empty() {
            tracing::warn!("No documents provided for creating vector index");
            return None;
        }

        tracing::info!("Creating vector index from {} documents", documents.len());

        let mut pending = Vec::new();
        for doc in documents {
            for (i, chunk) in self.splitter.split_text(&doc.text).into_iter().enumerate() {
                pending.push((doc, i, chunk.content));
            }
        }

        if pending.is_empty() {
            tracing::warn!("Documents produced no chunks");
            return None;
        }

        // Prepend the page title for better embedding context
        let texts: Vec<String> = pending
            .iter()
            .map(|(doc, _, text)| format!("Title: {}\n{}", doc.title, text))
            .collect();

        let embeddings = match self.embedder.embed(&texts).await {
            Ok(e) => e,
            Err(e) => {
                tracing::error!("Error creating vector index: {e:#}");
                return None;
            }
        };

        if embeddings.len() != pending.len() {
            tracing::error!(
                "Embedding count mismatch: {} chunks, {} embeddings",
                pending.len(),
                embeddings.len()
            );
            return None;
        }

        let nodes: Vec<Node> = pending
            .into_iter()
            .zip(embeddings)
            .map(|((doc, chunk_index, text), embedding)| Node {
                id: Uuid::new_v4(),
                source_title: doc.title.clone(),
                source_url: doc.url.clone(),
                chunk_index,
                text,
                embedding,
            })
            .collect();

        tracing::info!("Vector index created with {} nodes", nodes.len());
        Some(VectorIndex::new(nodes))
    }
}
