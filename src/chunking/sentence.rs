//! Sentence splitter.
//!
//! 1. Split text at Unicode sentence boundaries
//! 2. Cut any sentence longer than the budget into word windows
//! 3. Pack sentences greedily up to `chunk_size` tokens
//! 4. Seed each new chunk with trailing sentences of the previous one, up to
//!    `chunk_overlap` tokens

use unicode_segmentation::UnicodeSegmentation;

use super::{count_tokens, ChunkOutput, ChunkingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// A sentence (or a window of a long sentence) with its token count.
#[derive(Debug, Clone)]
struct Unit {
    text: String,
    tokens: usize,
}

impl SentenceSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into overlapping chunks of at most `chunk_size` tokens.
    pub fn split_text(&self, text: &str) -> Vec<ChunkOutput> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let units = self.sentence_units(text);

        let mut chunks = Vec::new();
        let mut current: Vec<Unit> = Vec::new();
        let mut current_tokens = 0usize;

        for unit in units {
            if !current.is_empty() && current_tokens + unit.tokens > self.chunk_size {
                chunks.push(join_units(&current));

                let (carried, carried_tokens) = self.carry_overlap(&current, unit.tokens);
                current = carried;
                current_tokens = carried_tokens;
            }
            current_tokens += unit.tokens;
            current.push(unit);
        }

        if !current.is_empty() {
            chunks.push(join_units(&current));
        }

        chunks
    }

    fn sentence_units(&self, text: &str) -> Vec<Unit> {
        let mut units = Vec::new();

        for sentence in text.split_sentence_bounds() {
            let sentence = sentence.trim();
            let tokens = count_tokens(sentence);
            if tokens == 0 {
                continue;
            }

            if tokens <= self.chunk_size {
                units.push(Unit {
                    text: sentence.to_string(),
                    tokens,
                });
                continue;
            }

            // Sentence alone exceeds the budget
            let words: Vec<&str> = sentence.split_whitespace().collect();
            for window in words.chunks(self.chunk_size) {
                units.push(Unit {
                    text: window.join(" "),
                    tokens: window.len(),
                });
            }
        }

        units
    }

    /// Trailing units of `previous` worth at most `chunk_overlap` tokens,
    /// trimmed from the front until `next_tokens` still fits.
    fn carry_overlap(&self, previous: &[Unit], next_tokens: usize) -> (Vec<Unit>, usize) {
        let mut carried = Vec::new();
        let mut carried_tokens = 0usize;

        for unit in previous.iter().rev() {
            if carried_tokens + unit.tokens > self.chunk_overlap {
                break;
            }
            carried_tokens += unit.tokens;
            carried.push(unit.clone());
        }
        carried.reverse();

        while !carried.is_empty() && carried_tokens + next_tokens > self.chunk_size {
            let dropped = carried.remove(0);
            carried_tokens -= dropped.tokens;
        }

        (carried, carried_tokens)
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 150,
            chunk_overlap: 40,
        }
    }
}

fn join_units(units: &[Unit]) -> ChunkOutput {
    let content = units
        .iter()
        .map(|u| u.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    ChunkOutput {
        token_count: units.iter().map(|u| u.tokens).sum(),
        content,
    }
}
