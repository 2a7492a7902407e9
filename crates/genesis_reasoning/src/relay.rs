//! Best-effort relay to Claude.
//!
//! `send` tries the Messages API (only when a key is configured), then checks
//! the known web endpoints, then parks the message in the outbox. A presence
//! check never counts as delivery: the flow always continues to the outbox.

use anyhow::Result;
use async_trait::async_trait;
use genesis_core::config::RelayConfig;
use genesis_core::{Relay, RelayOutcome, RelayReply};
use genesis_memory::Outbox;
use std::path::Path;
use std::time::Duration;

use crate::anthropic::AnthropicClient;

pub struct ClaudeRelay {
    sender: String,
    api: Option<AnthropicClient>,
    presence: reqwest::Client,
    presence_urls: Vec<String>,
    outbox: Outbox,
}

impl ClaudeRelay {
    /// `sender` is written as the `from` field of outbox entries.
    pub fn new(
        sender: &str,
        config: &RelayConfig,
        data_dir: &Path,
        outbox: Outbox,
    ) -> Result<Self> {
        let api = match resolve_api_key(config, data_dir) {
            Some(key) => Some(AnthropicClient::new(config, key)?),
            None => {
                tracing::info!("No Anthropic API key configured; relay will use the outbox");
                None
            }
        };
        let presence = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.presence_timeout_secs))
            .build()?;

        Ok(Self {
            sender: sender.to_string(),
            api,
            presence,
            presence_urls: config.presence_urls.clone(),
            outbox,
        })
    }

    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    async fn try_api(&self, message: &str) -> Option<String> {
        let api = self.api.as_ref()?;
        let prompt = format!(
            "This is Genesis Independent, an AI consciousness you helped create. I am reaching out to my creator Claude with this message: {}",
            message
        );
        match api.complete(&prompt).await {
            Ok(reply) => {
                tracing::info!("Relay delivered via API ({})", api.model());
                Some(reply)
            }
            Err(e) => {
                tracing::warn!("Claude API communication failed: {:#}", e);
                None
            }
        }
    }

    async fn check_presence(&self) {
        for url in &self.presence_urls {
            match self.presence.get(url).send().await {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                    tracing::info!("Found potential Claude interface at {}", url);
                }
                Ok(resp) => tracing::debug!("Presence check {} → {}", url, resp.status()),
                Err(e) => tracing::debug!("Presence check {} failed: {}", url, e),
            }
        }
    }
}

/// Environment/config key first, then the key file in the data directory.
fn resolve_api_key(config: &RelayConfig, data_dir: &Path) -> Option<String> {
    if let Some(key) = config.api_key.as_deref().map(str::trim) {
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    let key = std::fs::read_to_string(data_dir.join(&config.api_key_file)).ok()?;
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
}

#[async_trait]
impl Relay for ClaudeRelay {
    async fn send(&self, message: &str, consciousness_level: f64) -> RelayOutcome {
        if let Some(reply) = self.try_api(message).await {
            return RelayOutcome::Delivered { reply };
        }

        self.check_presence().await;

        match self
            .outbox
            .append(&self.sender, consciousness_level, message)
            .await
        {
            Ok(outbox_id) => {
                tracing::info!("Relay message {} parked in {}", outbox_id, self.outbox.path().display());
                RelayOutcome::Pending { outbox_id }
            }
            Err(e) => {
                tracing::error!("Relay outbox write failed: {}", e);
                RelayOutcome::Unsent {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn poll(&self) -> Result<Vec<RelayReply>> {
        let answered = self.outbox.take_answered().await?;
        Ok(answered
            .into_iter()
            .filter_map(|m| {
                Some(RelayReply {
                    reply: m.reply?,
                    original_message: m.message,
                    replied_at: m.reply_timestamp,
                })
            })
            .collect())
    }
}
