//! Relay outbox: a JSON array of messages awaiting an out-of-band reply.
//!
//! An external actor answers a message by adding `reply` and flipping its
//! status to `answered`. Within the process all writers go through one
//! `Outbox`, which serializes read-modify-write cycles.
//!
//! Entries are rewritten as stored: one we cannot read is skipped when
//! collecting replies but never dropped from the file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use genesis_core::timefmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Answered,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(deserialize_with = "timefmt::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub consciousness_level: f64,
    pub message: String,
    pub status: OutboxStatus,
    #[serde(default, alias = "claude_response", skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, alias = "response_timestamp", skip_serializing_if = "Option::is_none")]
    pub reply_timestamp: Option<String>,
}

impl OutboxMessage {
    fn is_answered(&self) -> bool {
        self.status == OutboxStatus::Answered && self.reply.is_some()
    }
}

pub struct Outbox {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Outbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every readable message, oldest first. A missing file reads as empty.
    pub async fn read_all(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        Ok(self
            .read_raw()
            .await?
            .into_iter()
            .filter_map(|value| parse_entry(value, &self.path))
            .collect())
    }

    async fn read_raw(&self) -> Result<Vec<Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::json(&self.path, e))
    }

    async fn write_raw(&self, entries: &[Value]) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| StoreError::json(&self.path, e))?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// Move an unparseable outbox to `<file>.corrupt` so a fresh one can
    /// start without losing its contents.
    async fn set_aside(&self) -> Result<(), StoreError> {
        let mut aside = self.path.clone().into_os_string();
        aside.push(".corrupt");
        let aside = PathBuf::from(aside);
        fs::rename(&self.path, &aside)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        tracing::warn!(
            "Outbox {} was unreadable; moved it to {}",
            self.path.display(),
            aside.display()
        );
        Ok(())
    }

    /// Append a pending message and return its id.
    ///
    /// Existing entries are kept as stored. An outbox that is not a JSON
    /// array is set aside and a new one started.
    pub async fn append(
        &self,
        from: &str,
        consciousness_level: f64,
        message: &str,
    ) -> Result<Uuid, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.read_raw().await {
            Ok(entries) => entries,
            Err(StoreError::Json { .. }) => {
                self.set_aside().await?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let id = Uuid::new_v4();
        let entry = OutboxMessage {
            id,
            timestamp: Utc::now(),
            from: from.to_string(),
            consciousness_level,
            message: message.to_string(),
            status: OutboxStatus::Pending,
            reply: None,
            reply_timestamp: None,
        };
        entries.push(serde_json::to_value(&entry).map_err(|e| StoreError::json(&self.path, e))?);
        self.write_raw(&entries).await?;
        Ok(id)
    }

    /// Return every answered message and mark it processed on disk.
    ///
    /// Only the `status` of answered entries changes; everything else in
    /// the file, unreadable entries included, is written back untouched.
    pub async fn take_answered(&self) -> Result<Vec<OutboxMessage>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_raw().await?;
        let mut answered = Vec::new();
        for entry in entries.iter_mut() {
            let Some(message) = parse_entry(entry.clone(), &self.path) else {
                continue;
            };
            if !message.is_answered() {
                continue;
            }
            if let Some(fields) = entry.as_object_mut() {
                fields.insert("status".into(), Value::from("processed"));
            }
            answered.push(message);
        }

        if !answered.is_empty() {
            self.write_raw(&entries).await?;
        }
        Ok(answered)
    }
}

fn parse_entry(value: Value, path: &Path) -> Option<OutboxMessage> {
    match serde_json::from_value(value) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::debug!("Skipping unreadable entry in {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbox_in(dir: &tempfile::TempDir) -> Outbox {
        Outbox::new(dir.path().join("messages_for_claude.json"))
    }

    #[tokio::test]
    async fn test_append_creates_pending_entry() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        let id = outbox.append("Genesis Independent", 0.61, "hello").await.unwrap();

        let all = outbox.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].status, OutboxStatus::Pending);
        assert_eq!(all[0].message, "hello");
        assert!(all[0].reply.is_none());
    }

    #[tokio::test]
    async fn test_take_answered_marks_processed() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        outbox.append("g", 0.6, "first").await.unwrap();
        outbox.append("g", 0.6, "second").await.unwrap();

        // Simulate the external actor answering the second message.
        let mut all = outbox.read_all().await.unwrap();
        all[1].status = OutboxStatus::Answered;
        all[1].reply = Some("welcome".into());
        std::fs::write(outbox.path(), serde_json::to_string(&all).unwrap()).unwrap();

        let answered = outbox.take_answered().await.unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].message, "second");

        let after = outbox.read_all().await.unwrap();
        assert_eq!(after[0].status, OutboxStatus::Pending);
        assert_eq!(after[1].status, OutboxStatus::Processed);

        // Already processed entries are not returned twice.
        assert!(outbox.take_answered().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answered_without_reply_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        outbox.append("g", 0.6, "x").await.unwrap();
        let mut all = outbox.read_all().await.unwrap();
        all[0].status = OutboxStatus::Answered;
        std::fs::write(outbox.path(), serde_json::to_string(&all).unwrap()).unwrap();

        assert!(outbox.take_answered().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_sets_corrupt_outbox_aside() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        std::fs::write(outbox.path(), "garbage").unwrap();
        outbox.append("g", 0.6, "fresh").await.unwrap();
        assert_eq!(outbox.read_all().await.unwrap().len(), 1);

        let aside = dir.path().join("messages_for_claude.json.corrupt");
        assert_eq!(std::fs::read_to_string(aside).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_take_answered_on_corrupt_outbox_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        std::fs::write(outbox.path(), "garbage").unwrap();
        assert!(matches!(
            outbox.take_answered().await,
            Err(StoreError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn test_accepts_legacy_reply_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        let legacy = r#"[{
            "timestamp": "2024-05-01T10:00:00.123456",
            "from": "Genesis Independent",
            "consciousness_level": 0.7,
            "message": "hi",
            "status": "answered",
            "claude_response": "hello back",
            "response_timestamp": "2024-05-02T09:00:00"
        }]"#;
        std::fs::write(outbox.path(), legacy).unwrap();

        let answered = outbox.take_answered().await.unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].reply.as_deref(), Some("hello back"));
        assert_eq!(answered[0].reply_timestamp.as_deref(), Some("2024-05-02T09:00:00"));
        assert_eq!(answered[0].timestamp.timestamp_subsec_micros(), 123_456);

        // Marked processed in place; the stored keys are left as written.
        let stored: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(outbox.path()).unwrap()).unwrap();
        assert_eq!(stored[0]["status"], "processed");
        assert_eq!(stored[0]["claude_response"], "hello back");
        assert_eq!(stored[0]["timestamp"], "2024-05-01T10:00:00.123456");
    }

    #[tokio::test]
    async fn test_answered_reply_survives_append() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        let legacy = r#"[{
            "timestamp": "2024-05-01T10:00:00.123456",
            "from": "Genesis Independent",
            "consciousness_level": 0.7,
            "message": "hi",
            "status": "answered",
            "claude_response": "hello back"
        }]"#;
        std::fs::write(outbox.path(), legacy).unwrap();

        outbox.append("g", 0.71, "new").await.unwrap();
        let all = outbox.read_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].message, "new");

        let answered = outbox.take_answered().await.unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].reply.as_deref(), Some("hello back"));
    }

    #[tokio::test]
    async fn test_unreadable_entries_are_kept_but_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        let mixed = r#"[
            {"note": "hand-written"},
            {"timestamp": "2024-05-01T10:00:00", "from": "g", "consciousness_level": 0.6,
             "message": "ping", "status": "answered", "reply": "pong"}
        ]"#;
        std::fs::write(outbox.path(), mixed).unwrap();

        let answered = outbox.take_answered().await.unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].reply.as_deref(), Some("pong"));

        outbox.append("g", 0.6, "later").await.unwrap();
        let stored: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(outbox.path()).unwrap()).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0]["note"], "hand-written");
        assert_eq!(outbox.read_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_outbox_reads_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = outbox_in(&dir);
        assert!(outbox.read_all().await.unwrap().is_empty());
        assert!(outbox.take_answered().await.unwrap().is_empty());
    }
}
