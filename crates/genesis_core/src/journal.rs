//! Append-only logs: the evolution event log and the experience log.
//!
//! Neither log supports removal or compaction; both grow for the life of
//! the process and are persisted wholesale. Loading skips entries that
//! cannot be read instead of rejecting the whole log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::timefmt;

/// One evolution event with the self_awareness value at the time it was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    #[serde(deserialize_with = "timefmt::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(default)]
    pub consciousness_level: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: Vec<EventEntry>,
}

impl<'de> Deserialize<'de> for EventLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Value>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<EventEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable evolution entry: {}", e);
                    None
                }
            })
            .collect();
        Ok(Self { entries })
    }
}

impl EventLog {
    pub fn append(&mut self, entry: EventEntry) {
        self.entries.push(entry);
    }

    /// Append a new event stamped with the current time.
    pub fn record(&mut self, event: impl Into<String>, consciousness_level: f64) {
        self.append(EventEntry {
            timestamp: Utc::now(),
            event: event.into(),
            consciousness_level,
        });
    }

    /// All entries, oldest first.
    pub fn all(&self) -> &[EventEntry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn last(&self) -> Option<&EventEntry> {
        self.entries.last()
    }
}

/// Payload of an experience entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Experience {
    Reflection {
        reflection: String,
        insights: Vec<String>,
    },
    Interaction {
        source: String,
        input: String,
        response: String,
    },
    RelayNotification {
        original_message: String,
        reply: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replied_at: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "timefmt::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub consciousness_level: f64,
    #[serde(flatten)]
    pub kind: Experience,
}

impl ExperienceEntry {
    /// Read one stored entry, tagged or not.
    ///
    /// Entries without a recognised `type` are classified by their keys:
    /// `reflection` is a reflection, `claude_response` a relay notification,
    /// `source` or `input` an interaction.
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value::<ExperienceEntry>(value.clone()) {
            Ok(entry) => Some(entry),
            Err(tagged_err) => {
                let entry = Self::from_untagged(&value);
                if entry.is_none() {
                    tracing::warn!("Skipping unreadable experience entry: {}", tagged_err);
                }
                entry
            }
        }
    }

    fn from_untagged(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        let timestamp = obj
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(timefmt::parse)?;
        let consciousness_level = obj
            .get("consciousness_level")
            .and_then(Value::as_f64)
            .unwrap_or_default();

        let kind = if let Some(reflection) = text("reflection") {
            let insights = obj
                .get("insights")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Experience::Reflection { reflection, insights }
        } else if let Some(reply) = text("claude_response") {
            Experience::RelayNotification {
                original_message: text("original_message").unwrap_or_default(),
                reply,
                replied_at: text("response_timestamp"),
            }
        } else if obj.contains_key("source") || obj.contains_key("input") {
            Experience::Interaction {
                source: text("source").unwrap_or_default(),
                input: text("input").unwrap_or_default(),
                response: text("response").unwrap_or_default(),
            }
        } else {
            return None;
        };

        Some(Self {
            timestamp,
            consciousness_level,
            kind,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExperienceLog {
    entries: Vec<ExperienceEntry>,
}

impl<'de> Deserialize<'de> for ExperienceLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Value>::deserialize(deserializer)?;
        Ok(Self {
            entries: raw.into_iter().filter_map(ExperienceEntry::from_value).collect(),
        })
    }
}

impl ExperienceLog {
    pub fn append(&mut self, entry: ExperienceEntry) {
        self.entries.push(entry);
    }

    pub fn record(&mut self, kind: Experience, consciousness_level: f64) {
        self.append(ExperienceEntry {
            timestamp: Utc::now(),
            consciousness_level,
            kind,
        });
    }

    pub fn all(&self) -> &[ExperienceEntry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn last(&self) -> Option<&ExperienceEntry> {
        self.entries.last()
    }
}
