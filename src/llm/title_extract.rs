use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::ChatModel;
use crate::rag::TitleExtractor;

/// Titles kept from a single extraction.
pub const MAX_TITLES: usize = 5;

/// Asks the chat model for Wikipedia page titles relevant to a query.
pub struct LlmTitleExtractor {
    llm: Arc<dyn ChatModel>,
}

impl LlmTitleExtractor {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl TitleExtractor for LlmTitleExtractor {
    async fn extract_titles(&self, query: &str) -> Vec<String> {
        let prompt = build_prompt(query);

        match self.llm.complete(&prompt).await {
            Ok(response) => {
                let titles = parse_titles(&response);
                tracing::info!("Extracted {} Wikipedia titles: {:?}", titles.len(), titles);
                titles
            }
            Err(e) => {
                tracing::warn!("Title extraction failed: {e:#}");
                Vec::new()
            }
        }
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        "You are a Wikipedia research assistant. Your task is to analyze the user's query and \
         identify exactly 5 relevant Wikipedia page titles that would contain information to \
         help answer their question.\n\n\
         INSTRUCTIONS:\n\
         1. Extract exactly 5 Wikipedia page titles (no more, no less)\n\
         2. Use exact Wikipedia page titles (proper capitalization and formatting)\n\
         3. Focus on the most relevant and specific topics first\n\
         4. Include broader context topics if needed to reach 5 titles\n\
         5. If the query has insufficient information for 5 relevant titles, return an empty array []\n\n\
         GUIDELINES:\n\
         - Prioritize main subjects, entities, concepts, events, or people mentioned\n\
         - Include related topics that provide essential context\n\
         - Use standard Wikipedia naming conventions (e.g., \"World War II\" not \"WWII\")\n\
         - Avoid overly specific subtopics that might not have dedicated Wikipedia pages\n\
         - Consider historical, scientific, geographical, or biographical pages as appropriate\n\n\
         USER QUERY: {query}\n\n\
         Return your response as a JSON array of exactly 5 strings (Wikipedia titles), or an \
         empty array [] if insufficient relevant content can be identified.\n\n\
         Examples:\n\
         - Query: \"What is the capital of France?\" → [\"Paris\", \"France\", \"Geography of France\", \"History of Paris\", \"French culture\"]\n\
         - Query: \"How does photosynthesis work?\" → [\"Photosynthesis\", \"Chlorophyll\", \"Carbon dioxide\", \"Cellular respiration\", \"Plant\"]\n\
         - Query: \"Random gibberish xyz123\" → []\n\n\
         Response format: [\"Title 1\", \"Title 2\", \"Title 3\", \"Title 4\", \"Title 5\"] or []"
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TitleExtraction {
    List(Vec<String>),
    Object { titles: Vec<String> },
}

/// Lenient parse of the model output: a bare JSON array or `{"titles": [...]}`,
/// possibly wrapped in prose or a code fence. Anything else yields no titles.
fn parse_titles(content: &str) -> Vec<String> {
    let parsed = serde_json::from_str::<TitleExtraction>(content.trim()).or_else(|_| {
        // Extract the JSON array from surrounding text
        let json_str = match (content.find('['), content.rfind(']')) {
            (Some(start), Some(end)) if start < end => &content[start..=end],
            _ => content,
        };
        serde_json::from_str::<TitleExtraction>(json_str)
    });

    match parsed {
        Ok(TitleExtraction::List(titles)) | Ok(TitleExtraction::Object { titles }) => titles
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_TITLES)
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to parse extracted titles: {e}. Raw: {content}");
            Vec::new()
        }
    }
}
