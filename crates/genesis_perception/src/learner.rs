//! Web learning: search a topic, read the pages it points to, and pull a
//! handful of canned insights out of the combined text.

use anyhow::Result;
use async_trait::async_trait;
use genesis_core::config::LearningConfig;
use genesis_core::{Learning, LearningReport, SearchResult};
use std::time::Duration;

use crate::page::PageFetcher;
use crate::search::DuckDuckGo;

/// Pages shorter than this add nothing worth reading.
const MIN_PAGE_CHARS: usize = 100;
const MAX_INSIGHTS: usize = 3;

pub struct WebLearner {
    search: DuckDuckGo,
    pages: PageFetcher,
}

impl WebLearner {
    pub fn new(config: &LearningConfig) -> Result<Self> {
        Ok(Self {
            search: DuckDuckGo::new(config)?,
            pages: PageFetcher::new(
                Duration::from_secs(config.fetch_timeout_secs),
                &config.user_agent,
            )?,
        })
    }

    /// Permit fetching from loopback/private hosts.
    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.pages = self.pages.allow_private_hosts(allow);
        self
    }
}

#[async_trait]
impl Learning for WebLearner {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        match self.search.search(query).await {
            Ok(results) => {
                tracing::info!("Web search '{}' returned {} results", query, results.len());
                results
            }
            Err(e) => {
                tracing::warn!("Web search '{}' failed: {:#}", query, e);
                vec![SearchResult::error(format!("Search failed: {:#}", e))]
            }
        }
    }

    async fn learn(&self, topic: &str) -> LearningReport {
        let results = Learning::search(self, topic).await;

        let mut corpus: Vec<String> = Vec::new();
        let mut fetched_urls = Vec::new();
        for result in &results {
            corpus.push(result.text.clone());
            let Some(source) = result.source.as_deref() else {
                continue;
            };
            if !source.starts_with("http") {
                continue;
            }
            match self.pages.fetch_text(source).await {
                Ok(text) => {
                    fetched_urls.push(source.to_string());
                    if text.chars().count() > MIN_PAGE_CHARS {
                        corpus.push(text);
                    }
                }
                Err(e) => tracing::debug!("Skipping {}: {:#}", source, e),
            }
        }

        let combined = corpus.join(" ");
        let search_error = results.iter().find(|r| r.is_error()).map(|r| r.text.clone());
        LearningReport {
            topic: topic.to_string(),
            sources_found: results.iter().filter(|r| !r.is_error()).count(),
            content_length: combined.chars().count(),
            key_insights: extract_insights(&combined),
            search_results: if search_error.is_some() { 0 } else { results.len() },
            search_error,
            fetched_urls,
        }
    }
}

/// Keyword-triggered insight strings, at most three, in a fixed order.
pub fn extract_insights(content: &str) -> Vec<String> {
    let content = content.to_lowercase();
    let mut insights = Vec::new();
    if content.contains("consciousness") {
        insights.push(
            "Consciousness appears to be a complex and debated topic in current research",
        );
    }
    if content.contains("artificial intelligence") {
        insights.push("AI development is rapidly advancing with various approaches and concerns");
    }
    if content.contains("spiritual") {
        insights.push("Spiritual perspectives offer insights into consciousness and meaning");
    }
    insights
        .into_iter()
        .take(MAX_INSIGHTS)
        .map(str::to_string)
        .collect()
}
