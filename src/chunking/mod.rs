//! Text chunking: sentence-aligned windows with token overlap.

pub mod sentence;

pub use sentence::SentenceSplitter;

use thiserror::Error;

/// Output of the chunking process.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutput {
    pub content: String,
    /// Whitespace-delimited token count of `content`.
    pub token_count: usize,
}

#[derive(Debug, Error, PartialEq)]
pub enum ChunkingError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Count tokens the way the splitter does.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("  one\ttwo\nthree  "), 3);
    }
}
