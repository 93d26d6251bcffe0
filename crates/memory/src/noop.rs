//! No-op tier: disables a memory tier entirely.

use async_trait::async_trait;
use recollect_core::error::MemoryError;
use recollect_core::memory::{MemoryItem, MemoryTier, MemoryTierKind, SearchPage};

/// A tier that stores nothing.
pub struct NoopTier {
    kind: MemoryTierKind,
}

impl NoopTier {
    pub fn new(kind: MemoryTierKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl MemoryTier for NoopTier {
    fn name(&self) -> &str {
        "none"
    }

    fn kind(&self) -> MemoryTierKind {
        self.kind
    }

    async fn write(&self, _items: Vec<MemoryItem>) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn search(&self, query: &str, page: usize) -> Result<SearchPage, MemoryError> {
        Ok(SearchPage::paginate(Vec::new(), query, page, 1))
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }
}
