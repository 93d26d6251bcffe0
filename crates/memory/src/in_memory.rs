//! In-memory tier: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use recollect_core::error::MemoryError;
use recollect_core::memory::{MemoryItem, MemoryTier, MemoryTierKind, SearchPage};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A tier that keeps items in a Vec, in write order.
pub struct InMemoryTier {
    kind: MemoryTierKind,
    page_size: usize,
    items: Arc<RwLock<Vec<MemoryItem>>>,
}

impl InMemoryTier {
    pub fn new(kind: MemoryTierKind, page_size: usize) -> Self {
        Self {
            kind,
            page_size,
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Everything written so far, oldest first.
    pub async fn items(&self) -> Vec<MemoryItem> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl MemoryTier for InMemoryTier {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn kind(&self) -> MemoryTierKind {
        self.kind
    }

    async fn write(&self, items: Vec<MemoryItem>) -> Result<(), MemoryError> {
        self.items.write().await.extend(items);
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
