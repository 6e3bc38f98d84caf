//! MediaWiki action API client: title resolution and plain-text extracts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::WikipediaConfig;
use crate::models::Document;
use crate::rag::ContentFetcher;

#[derive(Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    config: WikipediaConfig,
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    query: Option<T>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
}

impl WikipediaClient {
    pub fn new(http: reqwest::Client, config: WikipediaConfig) -> Self {
        Self { http, config }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .http
            .get(&self.config.api_url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .context("Failed to call Wikipedia API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Wikipedia API returned {status}: {body}");
        }

        resp.json().await.context("Failed to parse Wikipedia response")
    }

    /// Best search match for `title`, or `None` when the search is empty.
    pub async fn resolve_title(&self, title: &str) -> Result<Option<String>> {
        let body: QueryResponse<SearchQuery> = self
            .get(&[("list", "search"), ("srsearch", title), ("srlimit", "1")])
            .await?;
        Ok(first_search_title(body))
    }

    /// Plain-text extract of one page, following redirects. `None` when the
    /// page does not exist.
    pub async fn fetch_page(&self, title: &str) -> Result<Option<Document>> {
        let body: QueryResponse<PagesQuery> = self
            .get(&[
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        Ok(page_to_document(body))
    }

    async fn fetch_all(&self, titles: &[String]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(titles.len());

        for title in titles {
            let title = if self.config.resolve_titles {
                match self.resolve_title(title).await? {
                    Some(resolved) => {
                        if resolved != *title {
                            tracing::debug!("Resolved '{title}' to '{resolved}'");
                        }
                        resolved
                    }
                    None => title.clone(),
                }
            } else {
                title.clone()
            };

            match self.fetch_page(&title).await? {
                Some(doc) => documents.push(doc),
                None => tracing::warn!("Wikipedia page '{title}' does not exist, skipping"),
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl ContentFetcher for WikipediaClient {
    async fn fetch_content(&self, titles: &[String]) -> Vec<Document> {
        if titles.is_empty() {
            tracing::warn!("No titles provided for fetching content from Wikipedia");
            return Vec::new();
        }

        tracing::info!("Fetching content from Wikipedia for {} pages", titles.len());

        match self.fetch_all(titles).await {
            Ok(documents) => {
                tracing::info!("Fetched {} Wikipedia pages", documents.len());
                documents
            }
            Err(e) => {
                tracing::error!("Error fetching content from Wikipedia: {e:#}");
                Vec::new()
            }
        }
    }
}

fn first_search_title(body: QueryResponse<SearchQuery>) -> Option<String> {
    body.query?.search.into_iter().next().map(|hit| hit.title)
}

fn page_to_document(body: QueryResponse<PagesQuery>) -> Option<Document> {
    let page = body.query?.pages.into_iter().next()?;
    if page.missing || page.invalid {
        return None;
    }

    let url = page
        .fullurl
        .unwrap_or_else(|| format!("https://en.wikipedia.org/wiki/{}", page.title.replace(' ', "_")));

    Some(Document {
        title: page.title,
        url,
        text: page.extract.unwrap_or_default(),
    })
}
