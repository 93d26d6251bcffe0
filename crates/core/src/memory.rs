//! Memory tier traits: the colder stores behind core memory.
//!
//! - **Recall**: a searchable transcript. The loop writes every message it
//!   evicts from core memory here, in eviction order, once.
//! - **Archival**: curated long-term notes, written only via tool action.
//! - **Core store**: persisted core memory state for an agent instance.
//!
//! The loop only ever *writes* to recall. Searching is exposed to the model
//! as a tool, never invoked by the loop itself.

use crate::core_memory::CoreMemory;
use crate::error::MemoryError;
use crate::message::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which tier a store backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTierKind {
    Recall,
    Archival,
}

impl std::fmt::Display for MemoryTierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryTierKind::Recall => f.write_str("recall"),
            MemoryTierKind::Archival => f.write_str("archival"),
        }
    }
}

/// A piece of long-term knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    /// The text of the document
    pub content: String,

    /// Optional embedding vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            embedding: None,
            created_at: Utc::now(),
        }
    }
}

/// Anything a tier stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum MemoryItem {
    Message(Message),
    Document(Document),
}

impl MemoryItem {
    /// The searchable text of the item.
    pub fn content(&self) -> &str {
        match self {
            MemoryItem::Message(m) => &m.content,
            MemoryItem::Document(d) => &d.content,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            MemoryItem::Message(m) => m.timestamp,
            MemoryItem::Document(d) => d.created_at,
        }
    }
}

impl From<Message> for MemoryItem {
    fn from(m: Message) -> Self {
        MemoryItem::Message(m)
    }
}

impl From<Document> for MemoryItem {
    fn from(d: Document) -> Self {
        MemoryItem::Document(d)
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// The items on this page
    pub results: Vec<MemoryItem>,

    /// 1-based page number
    pub page: usize,

    /// Total pages (at least 1, even with no results)
    pub page_count: usize,

    /// The query that produced this page
    pub query: String,
}

impl SearchPage {
    /// Slice `matches` into the requested 1-based page of `page_size` items.
    pub fn paginate(
        matches: Vec<MemoryItem>,
        query: impl Into<String>,
        page: usize,
        page_size: usize,
    ) -> Self {
        let page_size = page_size.max(1);
        let page = page.max(1);
        let page_count = matches.len().div_ceil(page_size).max(1);
        let results = matches
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self {
            results,
            page,
            page_count,
            query: query.into(),
        }
    }
}

/// The memory tier gateway.
///
/// Implementations: in-memory, JSONL file, none (no-op).
#[async_trait]
pub trait MemoryTier: Send + Sync {
    /// The backend name (e.g., "in_memory", "file", "none").
    fn name(&self) -> &str;

    /// Which tier this store backs.
    fn kind(&self) -> MemoryTierKind;

    /// Append items, preserving their order.
    async fn write(&self, items: Vec<MemoryItem>) -> Result<(), MemoryError>;

    /// Search by text, returning the requested 1-based page.
    async fn search(&self, query: &str, page: usize) -> Result<SearchPage, MemoryError>;

    /// Number of stored items.
    async fn count(&self) -> Result<usize, MemoryError>;
}

/// Persisted core memory for one agent instance.
#[async_trait]
pub trait CoreStore: Send + Sync {
    fn name(&self) -> &str;

    /// The persisted core, or `None` when this instance has no prior state.
    async fn load(&self) -> Result<Option<CoreMemory>, MemoryError>;

    /// Overwrite the persisted core.
    async fn save(&self, core: &CoreMemory) -> Result<(), MemoryError>;
}
