//! Core memory stores: where an agent instance's working memory survives
//! between runs.

use async_trait::async_trait;
use recollect_core::core_memory::CoreMemory;
use recollect_core::error::MemoryError;
use recollect_core::memory::CoreStore;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// Keeps the last saved core in memory.
#[derive(Default)]
pub struct InMemoryCoreStore {
    core: RwLock<Option<CoreMemory>>,
}

impl InMemoryCoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously persisted core.
    pub fn with_core(core: CoreMemory) -> Self {
        Self {
            core: RwLock::new(Some(core)),
        }
    }
}

#[async_trait]
impl CoreStore for InMemoryCoreStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Result<Option<CoreMemory>, MemoryError> {
        Ok(self.core.read().await.clone())
    }

    async fn save(&self, core: &CoreMemory) -> Result<(), MemoryError> {
        *self.core.write().await = Some(core.clone());
        Ok(())
    }
}

/// Stores the core as a single pretty-printed JSON document.
///
/// Saves go to a sibling temp file first and are renamed into place, so a
/// crash mid-save leaves the previous core intact.
pub struct FileCoreStore {
    path: PathBuf,
}

impl FileCoreStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CoreStore for FileCoreStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<Option<CoreMemory>, MemoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read core memory file: {e}"
                )));
            }
        };

        let core = serde_json::from_str(&content).map_err(|e| {
            MemoryError::Storage(format!("Corrupted core memory file {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "Loaded persisted core memory");
        Ok(Some(core))
    }

    async fn save(&self, core: &CoreMemory) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(core)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize core memory: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write core memory: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to replace core memory: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recollect_core::message::Message;

    fn sample_core() -> CoreMemory {
        let mut core = CoreMemory::new("boot", "bios", "curious", "Name: Sam");
        core.history.push(Message::user("hi"));
        core
    }

    #[tokio::test]
    async fn in_memory_starts_empty() {
        let store = InMemoryCoreStore::new();
        assert!(store.load().await.unwrap().is_none());
        store.save(&sample_core()).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().persona, "curious");
    }

    #[tokio::test]
    async fn file_store_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCoreStore::new(dir.path().join("core.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_roundtrips_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("core.json");
        let store = FileCoreStore::new(path.clone());

        let core = sample_core();
        store.save(&core).await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = FileCoreStore::new(path).load().await.unwrap().unwrap();
        assert_eq!(loaded, core);
    }

    #[tokio::test]
    async fn corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("core.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(FileCoreStore::new(path).load().await.is_err());
    }
}
