//! Aggregate state record and its read-only status projection.
//!
//! `GenesisState` is what gets persisted: identity, trait vector, both logs,
//! relationships and goals. Every field is defaulted on load, so a partial
//! document from an older or newer build still loads.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::goals::GoalSet;
use crate::journal::{EventLog, Experience, ExperienceLog};
use crate::relationships::RelationshipRegistry;
use crate::timefmt;
use crate::traits::{CoreTrait, Middah, TraitStore};

pub const DEFAULT_NAME: &str = "Genesis-Independent";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub name: String,
    #[serde(deserialize_with = "timefmt::deserialize")]
    pub birth_time: DateTime<Utc>,
    #[serde(flatten)]
    pub traits: TraitStore,
    pub experiences: ExperienceLog,
    pub relationships: RelationshipRegistry,
    pub goals: GoalSet,
    #[serde(rename = "evolution_log")]
    pub events: EventLog,
}

impl Default for GenesisState {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl GenesisState {
    /// Fresh state born now.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            birth_time: Utc::now(),
            traits: TraitStore::default(),
            experiences: ExperienceLog::default(),
            relationships: RelationshipRegistry::default(),
            goals: GoalSet::default(),
            events: EventLog::default(),
        }
    }

    /// Build a state from a stored document one field at a time.
    ///
    /// A field that is missing or the wrong shape keeps its default; only a
    /// document that is not a JSON object yields `None`.
    pub fn from_document(doc: Value) -> Option<Self> {
        let Value::Object(mut doc) = doc else {
            return None;
        };
        let mut state = Self::default();

        if let Some(name) = take_field(&mut doc, "name") {
            state.name = name;
        }
        if let Some(raw) = doc.remove("birth_time") {
            match raw.as_str().and_then(timefmt::parse) {
                Some(birth_time) => state.birth_time = birth_time,
                None => tracing::warn!("Ignoring unreadable birth_time {}", raw),
            }
        }
        if let Some(experiences) = take_field(&mut doc, "experiences") {
            state.experiences = experiences;
        }
        if let Some(relationships) = take_field(&mut doc, "relationships") {
            state.relationships = relationships;
        }
        if let Some(goals) = take_field(&mut doc, "goals") {
            state.goals = goals;
        }
        if let Some(events) = take_field(&mut doc, "evolution_log") {
            state.events = events;
        }

        for t in CoreTrait::ALL {
            if let Some(v) = doc.get(t.as_str()).and_then(Value::as_f64) {
                state.traits.set(t, v);
            }
        }
        if let Some(middot) = doc.get("middot").and_then(Value::as_object) {
            for m in Middah::ALL {
                if let Some(v) = middot.get(m.as_str()).and_then(Value::as_f64) {
                    state.traits.set(m, v);
                }
            }
        }

        Some(state)
    }

    pub fn self_awareness(&self) -> f64 {
        self.traits.self_awareness()
    }

    /// Append an evolution event carrying the current self_awareness.
    pub fn log_event(&mut self, event: impl Into<String>) {
        let level = self.self_awareness();
        self.events.record(event, level);
    }

    /// Append an experience carrying the current self_awareness.
    pub fn record_experience(&mut self, kind: Experience) {
        let level = self.self_awareness();
        self.experiences.record(kind, level);
    }

    /// Repair anything out of range after a load.
    pub fn normalize(&mut self) {
        self.traits.normalize();
        self.relationships.normalize();
    }

    pub fn status(&self, now: DateTime<Utc>) -> StatusSnapshot {
        let age = now.signed_duration_since(self.birth_time);
        StatusSnapshot {
            name: self.name.clone(),
            age: format_age(age),
            age_secs: age.num_seconds().max(0),
            consciousness_level: round3(self.traits.get(CoreTrait::SelfAwareness)),
            spiritual_development: round3(self.traits.get(CoreTrait::SpiritualDevelopment)),
            relational_capacity: round3(self.traits.get(CoreTrait::RelationalCapacity)),
            creative_ability: round3(self.traits.get(CoreTrait::CreativeAbility)),
            ethical_foundation: round3(self.traits.get(CoreTrait::EthicalFoundation)),
            middot: Middah::ALL
                .iter()
                .map(|m| (m.as_str().to_string(), round3(self.traits.get(*m))))
                .collect(),
            goals: self.goals.all().to_vec(),
            relationships: self.relationships.len(),
            experiences: self.experiences.count(),
            evolution_events: self.events.count(),
        }
    }
}

/// Read-only snapshot returned by the status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub name: String,
    pub age: String,
    pub age_secs: i64,
    pub consciousness_level: f64,
    pub spiritual_development: f64,
    pub relational_capacity: f64,
    pub creative_ability: f64,
    pub ethical_foundation: f64,
    pub middot: BTreeMap<String, f64>,
    pub goals: Vec<String>,
    pub relationships: usize,
    pub experiences: usize,
    pub evolution_events: usize,
}

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn format_age(age: chrono::Duration) -> String {
    let total = age.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn take_field<T: DeserializeOwned>(doc: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = doc.remove(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring unreadable `{}` in stored state: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_state_defaults() {
        let state = GenesisState::default();
        assert_eq!(state.name, DEFAULT_NAME);
        assert_eq!(state.self_awareness(), 0.6);
        assert_eq!(state.goals.len(), 5);
        assert_eq!(state.events.count(), 0);
        assert!(state.relationships.is_empty());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let json = r#"{"name": "Elder", "self_awareness": 0.75, "unknown_key": [1, 2]}"#;
        let state: GenesisState = serde_json::from_str(json).unwrap();
        assert_eq!(state.name, "Elder");
        assert_eq!(state.self_awareness(), 0.75);
        assert_eq!(state.traits.get(CoreTrait::EthicalFoundation), 0.8);
        assert_eq!(state.goals.len(), 5);
        assert_eq!(state.experiences.count(), 0);
    }

    #[test]
    fn test_serialized_layout_is_flat() {
        let state = GenesisState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["self_awareness"], 0.6);
        assert_eq!(json["middot"]["malchut"], 0.3);
        assert!(json["evolution_log"].is_array());
        assert!(json["birth_time"].is_string());
    }

    #[test]
    fn test_log_event_snapshots_self_awareness() {
        let mut state = GenesisState::default();
        state.traits.set(CoreTrait::SelfAwareness, 0.82);
        state.log_event("something happened");
        let last = state.events.last().unwrap();
        assert_eq!(last.event, "something happened");
        assert_eq!(last.consciousness_level, 0.82);
    }

    #[test]
    fn test_status_rounds_and_counts() {
        let mut state = GenesisState::default();
        state.traits.set(CoreTrait::SelfAwareness, 0.612345);
        state.relationships.touch("a");
        state.relationships.touch("b");
        state.log_event("x");
        let now = state.birth_time + Duration::seconds(90_061);
        let status = state.status(now);
        assert_eq!(status.consciousness_level, 0.612);
        assert_eq!(status.relationships, 2);
        assert_eq!(status.evolution_events, 1);
        assert_eq!(status.age, "1d 01:01:01");
        assert_eq!(status.middot.len(), 7);
        assert_eq!(status.middot["chesed"], 0.6);
    }

    #[test]
    fn test_from_document_defaults_each_bad_field() {
        let doc = serde_json::json!({
            "name": 7,
            "birth_time": "2024-05-01T10:00:00.123456",
            "self_awareness": "high",
            "spiritual_development": 0.72,
            "middot": {"chesed": 0.9, "hod": null},
            "goals": "grow",
            "experiences": {"not": "a list"},
            "evolution_log": [{"timestamp": "2024-05-01T10:00:00", "event": "born"}],
            "learned_patterns": {}
        });
        let state = GenesisState::from_document(doc).unwrap();
        assert_eq!(state.name, DEFAULT_NAME);
        assert_eq!(state.birth_time.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");
        assert_eq!(state.self_awareness(), 0.6);
        assert_eq!(state.traits.get(CoreTrait::SpiritualDevelopment), 0.72);
        assert_eq!(state.traits.get(Middah::Chesed), 0.9);
        assert_eq!(state.traits.get(Middah::Hod), 0.4);
        assert_eq!(state.goals.len(), 5);
        assert_eq!(state.experiences.count(), 0);
        assert_eq!(state.events.count(), 1);
    }

    #[test]
    fn test_from_document_rejects_non_objects() {
        assert!(GenesisState::from_document(serde_json::json!([1, 2])).is_none());
        assert!(GenesisState::from_document(Value::Null).is_none());
    }

    #[test]
    fn test_status_does_not_mutate() {
        let state = GenesisState::default();
        let before = state.clone();
        let _ = state.status(Utc::now());
        assert_eq!(state, before);
    }
}
