//! Memory search tools: let the agent look up what left its core memory.
//!
//! One tool per tier: `search_recall` pages through the evicted message
//! transcript, `search_archival` through notes the agent chose to keep.
//! The loop itself never searches; only the model does, through these.

use async_trait::async_trait;
use recollect_core::error::ToolError;
use recollect_core::memory::{MemoryItem, MemoryTier, MemoryTierKind};
use recollect_core::tool::{Tool, ToolResult};
use std::sync::Arc;

/// Searches a single memory tier by text, one page at a time.
pub struct MemorySearchTool {
    tier: Arc<dyn MemoryTier>,
}

impl MemorySearchTool {
    pub fn new(tier: Arc<dyn MemoryTier>) -> Self {
        Self { tier }
    }
}

#[async_trait]
impl Tool for MemorySearchTool {
    fn name(&self) -> &str {
        match self.tier.kind() {
            MemoryTierKind::Recall => "search_recall",
            MemoryTierKind::Archival => "search_archival",
        }
    }

    fn description(&self) -> &str {
        match self.tier.kind() {
            MemoryTierKind::Recall => {
                "Search past conversation messages that are no longer in core memory. \
                 Results are newest first, one page at a time."
            }
            MemoryTierKind::Archival => {
                "Search your archival memory for notes you stored earlier with archive_content. \
                 Results are newest first, one page at a time."
            }
        }
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to look for (case-insensitive)"
                },
                "page": {
                    "type": "integer",
                    "description": "Which page of results to return, starting at 1",
                    "default": 1
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let page = arguments["page"].as_u64().unwrap_or(1).max(1) as usize;

        let found = self
            .tier
            .search(query, page)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        if found.results.is_empty() {
            return Ok(ToolResult::ok(format!(
                "No {} memories found matching '{query}' (page {} of {}).",
                self.tier.kind(),
                found.page,
                found.page_count
            )));
        }

        let mut output = format!(
            "Showing page {} of {} for '{query}':\n",
            found.page, found.page_count
        );
        for item in &found.results {
            let line = match item {
                MemoryItem::Message(m) => format!(
                    "[{}] {}: {}\n",
                    m.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    m.role,
                    m.content
                ),
                MemoryItem::Document(d) => format!(
                    "[{}] {}\n",
                    d.created_at.format("%Y-%m-%d %H:%M:%S"),
                    d.content
                ),
            };
            output.push_str(&line);
        }

        let data = serde_json::to_value(&found).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolResult::ok(output).with_data(data))
    }
}
