//! Segment editing tools. They never touch core memory themselves: each
//! returns a [`CoreEdit`] that the dispatcher applies once the call returns.

use async_trait::async_trait;
use recollect_core::core_memory::{CoreEdit, Segment};
use recollect_core::error::ToolError;
use recollect_core::tool::{Tool, ToolResult};

fn segment_arg(arguments: &serde_json::Value) -> Result<Segment, ToolError> {
    arguments["segment"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'segment' argument".into()))?
        .parse()
        .map_err(|e: recollect_core::core_memory::CoreEditError| {
            ToolError::InvalidArguments(e.to_string())
        })
}

fn string_arg<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

fn segment_property() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": ["persona", "human"],
        "description": "Which core memory segment to edit"
    })
}

/// Replace an exact piece of text inside a segment.
pub struct ReplaceContentInSegmentTool;

#[async_trait]
impl Tool for ReplaceContentInSegmentTool {
    fn name(&self) -> &str {
        "replace_content_in_segment"
    }

    fn description(&self) -> &str {
        "Replace the first occurrence of some exact text in the persona or human segment of core memory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "segment": segment_property(),
                "old_content": {
                    "type": "string",
                    "description": "Exact text currently in the segment"
                },
                "new_content": {
                    "type": "string",
                    "description": "Text to put in its place (may be empty to delete)"
                }
            },
            "required": ["segment", "old_content", "new_content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let segment = segment_arg(&arguments)?;
        let old_content = string_arg(&arguments, "old_content")?;
        let new_content = string_arg(&arguments, "new_content")?;

        Ok(
            ToolResult::ok(format!("Updated the {segment} segment.")).with_edit(
                CoreEdit::ReplaceInSegment {
                    segment,
                    old_content: old_content.to_string(),
                    new_content: new_content.to_string(),
                },
            ),
        )
    }
}

/// Overwrite a segment entirely.
pub struct ReplaceSegmentTool;

#[async_trait]
impl Tool for ReplaceSegmentTool {
    fn name(&self) -> &str {
        "replace_segment"
    }

    fn description(&self) -> &str {
        "Replace the whole persona or human segment of core memory with new text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "segment": segment_property(),
                "new_content": {
                    "type": "string",
                    "description": "The complete new text of the segment"
                }
            },
            "required": ["segment", "new_content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let segment = segment_arg(&arguments)?;
        let content = string_arg(&arguments, "new_content")?;

        Ok(ToolResult::ok(format!(
            "Replaced the {segment} segment ({} characters).",
            content.chars().count()
        ))
        .with_edit(CoreEdit::ReplaceSegment {
            segment,
            content: content.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_in_segment_returns_edit() {
        let result = ReplaceContentInSegmentTool
            .execute(serde_json::json!({
                "segment": "persona",
                "old_content": "tea",
                "new_content": "coffee"
            }))
            .await
            .unwrap();
        assert_eq!(
            result.edits,
            vec![CoreEdit::ReplaceInSegment {
                segment: Segment::Persona,
                old_content: "tea".into(),
                new_content: "coffee".into(),
            }]
        );
    }

    #[tokio::test]
    async fn replace_segment_returns_edit() {
        let result = ReplaceSegmentTool
            .execute(serde_json::json!({ "segment": "Human", "new_content": "Name: Sam" }))
            .await
            .unwrap();
        assert_eq!(
            result.edits,
            vec![CoreEdit::ReplaceSegment {
                segment: Segment::Human,
                content: "Name: Sam".into(),
            }]
        );
    }

    #[tokio::test]
    async fn unknown_segment_is_invalid() {
        let err = ReplaceSegmentTool
            .execute(serde_json::json!({ "segment": "bios", "new_content": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("bios")));
    }
}
