//! `archive_content`: the only way anything enters archival memory.

use async_trait::async_trait;
use recollect_core::error::ToolError;
use recollect_core::memory::{Document, MemoryTier};
use recollect_core::tool::{Tool, ToolResult};
use std::sync::Arc;

pub struct ArchiveContentTool {
    archival: Arc<dyn MemoryTier>,
}

impl ArchiveContentTool {
    pub fn new(archival: Arc<dyn MemoryTier>) -> Self {
        Self { archival }
    }
}

#[async_trait]
impl Tool for ArchiveContentTool {
    fn name(&self) -> &str {
        "archive_content"
    }

    fn description(&self) -> &str {
        "Store a note in archival memory so it can be found later with search_archival. \
         Use it for facts worth keeping that do not need to stay in core memory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The text to archive"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;
        if content.trim().is_empty() {
            return Ok(ToolResult::error("Nothing to archive: content is empty."));
        }

        let document = Document::new(content);
        let id = document.id.clone();
        self.archival
            .write(vec![document.into()])
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::ok(format!("Archived {} characters.", content.chars().count()))
            .with_data(serde_json::json!({ "id": id })))
    }
}
