use anyhow::{Context, Result};
use genesis_core::config::RelayConfig;
use reqwest::Client;
use std::time::Duration;

use crate::api_types::{Message, MessagesRequest, MessagesResponse, Role};

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &RelayConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .context("Failed to build Anthropic HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn completion; returns the text of the first content block.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let request_body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: Role::User,
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to Anthropic")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API Error ({}): {}", status, error_text);
        }

        let resp_text = response.text().await?;
        tracing::debug!(
            "Anthropic raw response (first 500 chars): {}",
            resp_text.chars().take(500).collect::<String>()
        );
        let api_response: MessagesResponse =
            serde_json::from_str(&resp_text).context("Failed to parse Anthropic response")?;

        api_response
            .first_text()
            .map(str::to_string)
            .context("Anthropic response had no text content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> RelayConfig {
        RelayConfig {
            base_url: format!("{}/", server.uri()),
            model: "claude-test".into(),
            max_tokens: 64,
            api_timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_complete_sends_headers_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-test",
                "max_tokens": 64,
                "messages": [{"role": "user", "content": "ping"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "pong"}],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&config_for(&server), "sk-test".into()).unwrap();
        assert_eq!(client.complete("ping").await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn test_complete_error_status_is_err() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&config_for(&server), "bad".into()).unwrap();
        let err = client.complete("ping").await.unwrap_err();
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_complete_skips_non_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "hello"}
                ]
            })))
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&config_for(&server), "k".into()).unwrap();
        assert_eq!(client.complete("hi").await.unwrap(), "hello");
    }
}
