use uuid::Uuid;

/// A stored chunk with its embedding
#[derive(Debug, Clone)]
pub struct Node {
    pub id: Uuid,
    pub source_title: String,
    pub source_url: String,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// In-memory vector index with cosine similarity search.
///
/// Built once per agent session and never mutated afterwards, so it needs no
/// locking and is shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct VectorIndex {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct NodeHit {
    pub node_id: Uuid,
    pub source_title: String,
    pub source_url: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

impl VectorIndex {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Search by cosine similarity against a query embedding.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<NodeHit> {
        let mut scored: Vec<(f32, &Node)> = self
            .nodes
            .iter()
            .map(|n| (cosine_similarity(query_embedding, &n.embedding), n))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, n)| NodeHit {
                node_id: n.id,
                source_title: n.source_title.clone(),
                source_url: n.source_url.clone(),
                chunk_index: n.chunk_index,
                text: n.text.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct source titles, in insertion order.
    pub fn source_titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if !titles.contains(&node.source_title.as_str()) {
                titles.push(&node.source_title);
            }
        }
        titles
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
