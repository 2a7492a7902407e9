//! Value types exchanged with the Learning and Relay collaborators, and the
//! trait effects that learning about a topic has on the aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::{CoreTrait, Middah, Trait};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    InstantAnswer,
    RelatedTopic,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub kind: SearchKind,
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl SearchResult {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: SearchKind::Error,
            text: text.into(),
            source: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == SearchKind::Error
    }
}

/// Summary of one `learn` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningReport {
    pub topic: String,
    pub sources_found: usize,
    pub content_length: usize,
    /// At most three entries.
    pub key_insights: Vec<String>,
    /// Results the topic search returned.
    #[serde(default)]
    pub search_results: usize,
    /// Set when the topic search itself failed.
    #[serde(default)]
    pub search_error: Option<String>,
    /// Pages that were fetched while reading the results.
    #[serde(default)]
    pub fetched_urls: Vec<String>,
}

/// Trait bumps applied whenever the system learns about `topic`.
pub fn topic_effects(topic: &str) -> Vec<(Trait, f64)> {
    let topic = topic.to_lowercase();
    let mut effects = Vec::new();
    if topic.contains("consciousness") || topic.contains("spiritual") {
        effects.push((CoreTrait::SpiritualDevelopment.into(), 0.02));
    }
    if topic.contains("love") || topic.contains("compassion") {
        effects.push((Middah::Chesed.into(), 0.02));
    }
    effects
}

/// Result of one relay attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// The API answered directly.
    Delivered { reply: String },
    /// Stored in the outbox for an out-of-band reply.
    Pending { outbox_id: Uuid },
    /// Every channel failed, including the outbox write.
    Unsent { reason: String },
}

/// An outbox entry that received a reply out-of-band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayReply {
    pub original_message: String,
    pub reply: String,
    #[serde(default)]
    pub replied_at: Option<String>,
}
