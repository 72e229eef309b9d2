//! Pluggable sources for remedy text.
//!
//! A lookup is best effort: it answers `None` whenever it has nothing
//! useful, and the enricher falls back to the catalog's static remedy.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Number of result snippets kept from a search page.
const MAX_SNIPPETS: usize = 3;

/// Snippets this short are navigation chrome rather than answers.
const MIN_SNIPPET_CHARS: usize = 50;

#[async_trait]
pub trait SolutionLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Option<String>;
}

/// Lookup that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl SolutionLookup for NoLookup {
    async fn lookup(&self, _query: &str) -> Option<String> {
        None
    }
}

/// Scrapes result snippets from a web search page.
pub struct WebSearchLookup {
    search_url: String,
    client: reqwest::Client,
}

impl WebSearchLookup {
    pub fn new(timeout: Duration) -> Self {
        Self::with_search_url(DEFAULT_SEARCH_URL, timeout)
    }

    pub fn with_search_url(search_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            search_url: search_url.to_string(),
            client,
        }
    }

    async fn fetch(&self, query: &str) -> reqwest::Result<Option<String>> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            log_debug!(
                "solution search for '{}' returned HTTP {}",
                query,
                response.status()
            );
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(extract_snippets(&body))
    }
}

#[async_trait]
impl SolutionLookup for WebSearchLookup {
    async fn lookup(&self, query: &str) -> Option<String> {
        match self.fetch(query).await {
            Ok(found) => found,
            Err(err) => {
                log_debug!("solution search for '{}' failed: {}", query, err);
                None
            }
        }
    }
}

/// Join the text of the first few long result snippets on a search page.
pub fn extract_snippets(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.BNeawe").ok()?;

    let snippets: Vec<String> = document
        .select(&selector)
        .take(MAX_SNIPPETS)
        .map(|element| element.text().collect::<String>())
        .filter(|text| text.chars().count() > MIN_SNIPPET_CHARS)
        .collect();

    if snippets.is_empty() {
        None
    } else {
        Some(snippets.join("\n\n"))
    }
}
