//! Memory tier implementations for Recollect.
//!
//! Each tier (recall, archival) is built from the same three backends:
//! in-memory, JSONL file, and no-op. Core memory persistence has its own
//! in-memory and JSON file stores.

pub mod core_store;
pub mod file_backend;
pub mod in_memory;
pub mod noop;

pub use core_store::{FileCoreStore, InMemoryCoreStore};
pub use file_backend::FileTier;
pub use in_memory::InMemoryTier;
pub use noop::NoopTier;

use recollect_config::{MemoryBackendKind, MemoryConfig};
use recollect_core::memory::{CoreStore, MemoryItem, MemoryTier, MemoryTierKind};
use std::sync::Arc;

/// The stores behind one agent instance, wired by name.
#[derive(Clone)]
pub struct MemoryTiers {
    pub recall: Arc<dyn MemoryTier>,
    pub archival: Arc<dyn MemoryTier>,
    pub core: Arc<dyn CoreStore>,
}

impl MemoryTiers {
    /// Build the configured backend for `instance_id`.
    ///
    /// File stores live under `<directory>/<instance_id>/`.
    pub fn from_config(config: &MemoryConfig, instance_id: &str) -> Self {
        match config.backend {
            MemoryBackendKind::InMemory => Self::in_memory(config.page_size),
            MemoryBackendKind::File => {
                let root = config.directory.join(instance_id);
                Self {
                    recall: Arc::new(FileTier::new(
                        root.join("recall.jsonl"),
                        MemoryTierKind::Recall,
                        config.page_size,
                    )),
                    archival: Arc::new(FileTier::new(
                        root.join("archival.jsonl"),
                        MemoryTierKind::Archival,
                        config.page_size,
                    )),
                    core: Arc::new(FileCoreStore::new(root.join("core.json"))),
                }
            }
            MemoryBackendKind::None => Self {
                recall: Arc::new(NoopTier::new(MemoryTierKind::Recall)),
                archival: Arc::new(NoopTier::new(MemoryTierKind::Archival)),
                core: Arc::new(InMemoryCoreStore::new()),
            },
        }
    }

    /// Process-local stores, used by tests and ephemeral sessions.
    pub fn in_memory(page_size: usize) -> Self {
        Self {
            recall: Arc::new(InMemoryTier::new(MemoryTierKind::Recall, page_size)),
            archival: Arc::new(InMemoryTier::new(MemoryTierKind::Archival, page_size)),
            core: Arc::new(InMemoryCoreStore::new()),
        }
    }
}

/// Case-insensitive substring match, most recently written first.
///
/// An empty query matches everything.
pub(crate) fn matching(items: &[MemoryItem], query: &str) -> Vec<MemoryItem> {
    let query_lower = query.trim().to_lowercase();
    items
        .iter()
        .rev()
        .filter(|item| item.content().to_lowercase().contains(&query_lower))
        .cloned()
        .collect()
}
