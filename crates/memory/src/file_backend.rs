//! File-based tier: append-only JSON-lines storage.
//!
//! Each line is a JSON-encoded `MemoryItem`. Items are loaded into memory on
//! creation and appended to disk on every write, so the file is always a
//! faithful transcript in write order.

use async_trait::async_trait;
use recollect_core::error::MemoryError;
use recollect_core::memory::{MemoryItem, MemoryTier, MemoryTierKind, SearchPage};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A file-backed tier using JSONL (one JSON object per line).
pub struct FileTier {
    path: PathBuf,
    kind: MemoryTierKind,
    page_size: usize,
    items: Arc<RwLock<Vec<MemoryItem>>>,
}

impl FileTier {
    /// Open a tier at `path`. A missing file starts empty and is created on
    /// first write.
    pub fn new(path: PathBuf, kind: MemoryTierKind, page_size: usize) -> Self {
        let items = Self::load_from_disk(&path);
        debug!(path = %path.display(), tier = %kind, count = items.len(), "File memory tier loaded");
        Self {
            path,
            kind,
            page_size,
            items: Arc::new(RwLock::new(items)),
        }
    }

    fn load_from_disk(path: &Path) -> Vec<MemoryItem> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryItem>(line) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Skipping corrupted memory line");
                    None
                }
            })
            .collect()
    }

    fn append(&self, items: &[MemoryItem]) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for item in items {
            let line = serde_json::to_string(item).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize memory item: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MemoryError::Storage(format!("Failed to open memory file: {e}")))?;
        file.write_all(content.as_bytes())
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl MemoryTier for FileTier {
    fn name(&self) -> &str {
        "file"
    }

    fn kind(&self) -> MemoryTierKind {
        self.kind
    }

    async fn write(&self, items: Vec<MemoryItem>) -> Result<(), MemoryError> {
        if items.is_empty() {
            return Ok(());
        }
        // Hold the lock across the append so concurrent writes keep file order.
        let mut stored = self.items.write().await;
        self.append(&items)?;
        stored.extend(items);
        Ok(())
    }

    async fn search(&self, query: &str, page: usize) -> Result<SearchPage, MemoryError> {
        let items = self.items.read().await;
        let matches = crate::matching(&items, query);
        Ok(SearchPage::paginate(matches, query, page, self.page_size))
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.items.read().await.len())
    }
}
