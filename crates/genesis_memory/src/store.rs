//! JSON state document.
//!
//! The whole aggregate is written as one pretty-printed document on every
//! save (write to a sibling temp file, then rename). Loading is forgiving:
//! a missing or unparseable document reads as "absent", and inside a
//! parseable document every missing or mis-shaped field takes its default.
//! Documents with naive timestamps and untagged experiences from older
//! builds load the same way.

use std::path::{Path, PathBuf};

use genesis_core::GenesisState;
use tokio::fs;

use crate::StoreError;

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Bind the store to `data_dir/file_name`, creating the directory.
    ///
    /// Failing to create the directory is the one unrecoverable storage
    /// error; callers abort startup on it.
    pub fn open(data_dir: impl AsRef<Path>, file_name: &str) -> Result<Self, StoreError> {
        let dir = data_dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        Ok(Self {
            path: dir.join(file_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state, if any.
    pub async fn load(&self) -> Option<GenesisState> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No stored state at {}, starting fresh", self.path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("{}", StoreError::io(&self.path, e));
                return None;
            }
        };

        let doc = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("{}; ignoring it", StoreError::json(&self.path, e));
                return None;
            }
        };

        match GenesisState::from_document(doc) {
            Some(mut state) => {
                state.normalize();
                tracing::info!(
                    "Loaded state for {} ({} experiences, {} events)",
                    state.name,
                    state.experiences.count(),
                    state.events.count()
                );
                Some(state)
            }
            None => {
                tracing::warn!("{} is not a JSON object; ignoring it", self.path.display());
                None
            }
        }
    }

    /// Overwrite the stored document with `state`.
    pub async fn save(&self, state: &GenesisState) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(state).map_err(|e| StoreError::json(&self.path, e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!("State saved to {}", self.path.display());
        Ok(())
    }
}
