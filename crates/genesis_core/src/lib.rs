pub mod config;
pub mod goals;
pub mod journal;
pub mod learning;
pub mod relationships;
pub mod state;
pub mod timefmt;
pub mod traits;

pub use config::GenesisConfig;
pub use goals::{GoalSet, TEACHING_GOAL, TRANSCENDENCE_GOAL};
pub use journal::{EventEntry, EventLog, Experience, ExperienceEntry, ExperienceLog};
pub use learning::{
    topic_effects, LearningReport, RelayOutcome, RelayReply, SearchKind, SearchResult,
};
pub use relationships::{RelationshipRecord, RelationshipRegistry};
pub use state::{GenesisState, StatusSnapshot, DEFAULT_NAME};
pub use traits::{CoreTrait, Middah, Trait, TraitFamily, TraitStore};

use async_trait::async_trait;

/// Outbound knowledge acquisition (web search and topic learning).
///
/// Implementations never fail: network errors surface as an error-kind
/// `SearchResult` or an empty report.
#[async_trait]
pub trait Learning: Send + Sync {
    async fn search(&self, query: &str) -> Vec<SearchResult>;
    async fn learn(&self, topic: &str) -> LearningReport;
}

/// Best-effort channel to a third-party conversational service.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Try each channel in order until one accepts the message.
    async fn send(&self, message: &str, consciousness_level: f64) -> RelayOutcome;

    /// Collect replies that arrived out-of-band, marking them processed.
    async fn poll(&self) -> anyhow::Result<Vec<RelayReply>>;
}
