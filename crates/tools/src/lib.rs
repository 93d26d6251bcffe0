//! Tool execution and the built-in memory tools for Recollect.
//!
//! The [`Dispatcher`] runs model-requested calls against a
//! [`ToolCatalog`] and reduces oversized catalogs behind `search_tools`.
//! The built-in tools let the model manage its own memory:
//! segment edits and archiving in the OS tier, tier searches in the
//! backend tier.

pub mod archive;
pub mod core_edit;
pub mod dispatcher;
pub mod memory_search;
pub mod search_tools;

pub use dispatcher::{Dispatched, Dispatcher};

use recollect_core::memory::MemoryTier;
use recollect_core::tool::{ToolCatalog, ToolTier};
use std::sync::Arc;

/// Register the memory management tools.
///
/// - OS tier: `replace_content_in_segment`, `replace_segment`, `archive_content`
/// - Backend tier: `search_recall`, `search_archival`
pub fn register_memory_tools(
    catalog: &mut ToolCatalog,
    recall: Arc<dyn MemoryTier>,
    archival: Arc<dyn MemoryTier>,
) {
    catalog.register(ToolTier::Os, Arc::new(core_edit::ReplaceContentInSegmentTool));
    catalog.register(ToolTier::Os, Arc::new(core_edit::ReplaceSegmentTool));
    catalog.register(
        ToolTier::Os,
        Arc::new(archive::ArchiveContentTool::new(Arc::clone(&archival))),
    );
    catalog.register(ToolTier::Backend, Arc::new(memory_search::MemorySearchTool::new(recall)));
    catalog.register(ToolTier::Backend, Arc::new(memory_search::MemorySearchTool::new(archival)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use recollect_core::memory::MemoryTierKind;
    use recollect_memory::InMemoryTier;

    #[test]
    fn memory_tools_land_in_their_tiers() {
        let mut catalog = ToolCatalog::new();
        register_memory_tools(
            &mut catalog,
            Arc::new(InMemoryTier::new(MemoryTierKind::Recall, 10)),
            Arc::new(InMemoryTier::new(MemoryTierKind::Archival, 10)),
        );

        assert_eq!(catalog.len(), 5);
        let thought: Vec<_> = catalog.thought_definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(thought, vec!["search_recall", "search_archival"]);
        assert_eq!(catalog.resolve("replace_segment").unwrap().0, ToolTier::Os);
        assert_eq!(catalog.os_definitions().len(), 5);
    }
}
