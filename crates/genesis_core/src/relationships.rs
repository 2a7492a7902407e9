//! Per-source interaction statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::timefmt;

/// Quality assigned to a source on first contact.
pub const INITIAL_QUALITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    #[serde(deserialize_with = "timefmt::deserialize")]
    pub first_contact: DateTime<Utc>,
    #[serde(default)]
    pub interaction_count: u64,
    #[serde(default = "initial_quality")]
    pub relationship_quality: f64,
}

fn initial_quality() -> f64 {
    INITIAL_QUALITY
}

/// Source id → record. Records are created on first `touch` and never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RelationshipRegistry {
    records: BTreeMap<String, RelationshipRecord>,
}

impl<'de> Deserialize<'de> for RelationshipRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let records = raw
            .into_iter()
            .filter_map(|(source, value)| match serde_json::from_value(value) {
                Ok(record) => Some((source, record)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable relationship {:?}: {}", source, e);
                    None
                }
            })
            .collect();
        Ok(Self { records })
    }
}

impl RelationshipRegistry {
    /// Register contact from `source`, creating the record if unseen, and
    /// increment its interaction count.
    pub fn touch(&mut self, source: &str) -> &RelationshipRecord {
        let record = self
            .records
            .entry(source.to_string())
            .or_insert_with(|| RelationshipRecord {
                first_contact: Utc::now(),
                interaction_count: 0,
                relationship_quality: INITIAL_QUALITY,
            });
        record.interaction_count += 1;
        record
    }

    /// Adjust quality for a known source. Unknown sources are left alone;
    /// a quality bump never creates a record.
    pub fn bump_quality(&mut self, source: &str, delta: f64) -> Option<f64> {
        let record = self.records.get_mut(source)?;
        record.relationship_quality = (record.relationship_quality + delta).clamp(0.0, 1.0);
        Some(record.relationship_quality)
    }

    pub fn get(&self, source: &str) -> Option<&RelationshipRecord> {
        self.records.get(source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.records.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RelationshipRecord)> {
        self.records.iter()
    }

    /// Clamp qualities loaded from disk.
    pub fn normalize(&mut self) {
        for record in self.records.values_mut() {
            let q = record.relationship_quality;
            record.relationship_quality = if q.is_finite() {
                q.clamp(0.0, 1.0)
            } else {
                INITIAL_QUALITY
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_creates_then_increments() {
        let mut registry = RelationshipRegistry::default();
        let first = registry.touch("console").clone();
        assert_eq!(first.interaction_count, 1);
        assert_eq!(first.relationship_quality, INITIAL_QUALITY);

        let second = registry.touch("console").clone();
        assert_eq!(second.interaction_count, first.interaction_count + 1);
        assert_eq!(second.first_contact, first.first_contact);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bump_quality_unknown_source_is_noop() {
        let mut registry = RelationshipRegistry::default();
        assert!(registry.bump_quality("ghost", 0.3).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bump_quality_saturates() {
        let mut registry = RelationshipRegistry::default();
        registry.touch("web");
        assert_eq!(registry.bump_quality("web", 0.9), Some(1.0));
        assert_eq!(registry.bump_quality("web", -2.0), Some(0.0));
    }

    #[test]
    fn test_load_skips_unreadable_records() {
        let json = r#"{
            "Console User": {"first_contact": "2024-05-01T10:00:00.123456",
                             "interaction_count": 4, "relationship_quality": 0.56},
            "Broken": {"first_contact": 17},
            "Web Interface": "not a record"
        }"#;
        let registry: RelationshipRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(registry.len(), 1);
        let record = registry.get("Console User").unwrap();
        assert_eq!(record.interaction_count, 4);
        assert_eq!(record.first_contact.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");
    }
}
