use anyhow::{Context, Result};
use genesis_core::config::LearningConfig;
use genesis_core::{SearchKind, SearchResult};
use serde::Deserialize;
use std::time::Duration;

/// Client for the DuckDuckGo instant-answer API.
pub struct DuckDuckGo {
    endpoint: String,
    max_results: usize,
    client: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstantAnswer {
    #[serde(rename = "Abstract")]
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

/// Topic groups carry `Name`/`Topics` instead of `Text`; they are skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
}

impl DuckDuckGo {
    pub fn new(config: &LearningConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.search_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            endpoint: config.search_url.clone(),
            max_results: config.max_results,
            client,
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .context("Failed to reach search API")?
            .error_for_status()?
            .text()
            .await?;

        // The API labels its JSON as javascript, so parse the text ourselves.
        let answer: InstantAnswer =
            serde_json::from_str(&body).context("Failed to parse search response")?;

        Ok(self.collect(answer))
    }

    fn collect(&self, answer: InstantAnswer) -> Vec<SearchResult> {
        let mut results = Vec::new();

        if !answer.abstract_text.is_empty() {
            let source = if answer.abstract_url.is_empty() {
                "DuckDuckGo".to_string()
            } else {
                answer.abstract_url
            };
            results.push(SearchResult {
                kind: SearchKind::InstantAnswer,
                text: answer.abstract_text,
                source: Some(source),
            });
        }

        for topic in answer.related_topics.into_iter().take(self.max_results) {
            if let Some(text) = topic.text {
                results.push(SearchResult {
                    kind: SearchKind::RelatedTopic,
                    text,
                    source: Some(topic.first_url.unwrap_or_else(|| "DuckDuckGo".to_string())),
                });
            }
        }

        results
    }
}
