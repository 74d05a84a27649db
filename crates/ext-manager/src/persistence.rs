//! Durable storage for the enabled extension set.

use std::sync::Mutex;

use async_trait::async_trait;
use ext_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where the enabled set lives between runs.
#[async_trait]
pub trait EnabledStore: Send + Sync {
    /// Read the persisted enabled ids.
    async fn enabled_ids(&self) -> Result<Vec<String>>;

    /// Replace the persisted enabled ids.
    async fn set_enabled_ids(&self, ids: &[String]) -> Result<()>;
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct EnabledState {
    #[serde(default)]
    enabled: Vec<String>,
}

/// Enabled set stored in a TOML or JSON file.
///
/// ```toml
/// enabled = ["editor-core", "git-blame"]
/// ```
///
/// A missing file reads as an empty set. Writes are atomic.
#[derive(Debug, Clone)]
pub struct FileEnabledStore {
    path: NormalizedPath,
    store: ConfigStore,
}

impl FileEnabledStore {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self {
            path: path.into(),
            store: ConfigStore::new(),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

#[async_trait]
impl EnabledStore for FileEnabledStore {
    async fn enabled_ids(&self) -> Result<Vec<String>> {
        let state: Option<EnabledState> = self.store.load_optional(&self.path)?;
        Ok(state.unwrap_or_default().enabled)
    }

    async fn set_enabled_ids(&self, ids: &[String]) -> Result<()> {
        let state = EnabledState {
            enabled: ids.to_vec(),
        };
        self.store.save(&self.path, &state)?;
        tracing::debug!(path = %self.path, count = ids.len(), "persisted enabled extensions");
        Ok(())
    }
}

/// Enabled set held in memory, for embedding hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryEnabledStore {
    ids: Mutex<Vec<String>>,
}

impl MemoryEnabledStore {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Current stored value.
    pub fn snapshot(&self) -> Vec<String> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EnabledStore for MemoryEnabledStore {
    async fn enabled_ids(&self) -> Result<Vec<String>> {
        Ok(self.snapshot())
    }

    async fn set_enabled_ids(&self, ids: &[String]) -> Result<()> {
        *self.ids.lock().unwrap_or_else(|e| e.into_inner()) = ids.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = FileEnabledStore::new(temp.path().join("enabled.toml"));
        assert!(store.enabled_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state").join("enabled.json");
        let store = FileEnabledStore::new(path.clone());

        store
            .set_enabled_ids(&["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();

        let reopened = FileEnabledStore::new(path);
        assert_eq!(reopened.enabled_ids().await.unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryEnabledStore::new(["a"]);
        assert_eq!(store.enabled_ids().await.unwrap(), vec!["a"]);
        store.set_enabled_ids(&["b".to_string()]).await.unwrap();
        assert_eq!(store.snapshot(), vec!["b"]);
    }
}
