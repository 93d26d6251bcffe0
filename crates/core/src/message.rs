//! Message and tool call domain types.
//!
//! These are the value objects that flow across every boundary:
//! stimuli arrive as messages, the inference backend answers with a message,
//! tools reply with messages, and evicted history goes to recall as messages.

use crate::error::MessageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Internal instructions (boot, bios, memory pressure notices)
    System,
    /// The human on the other end
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// The function half of a tool call: what to run and with which arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Name of the tool to invoke
    pub name: String,

    /// Parameter name → value
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// A model-requested invocation of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this call; echoed back as the result's `tool_call_id`
    pub id: String,

    pub function: ToolCallFunction,
}

impl ToolCall {
    /// Build a call with a fresh ID. Non-object `arguments` are treated as empty.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::with_id(format!("call_{}", Uuid::new_v4().simple()), name, arguments)
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            id: id.into(),
            function: ToolCallFunction {
                name: name.into(),
                arguments,
            },
        }
    }

    /// The requested tool name.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// A single message.
///
/// A `Role::Tool` message always carries a non-empty `tool_call_id`; every
/// constructor and the deserializer enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a message with any role, validating the tool-call invariant.
    pub fn new(
        role: Role,
        content: impl Into<String>,
        tool_call_id: Option<String>,
    ) -> Result<Self, MessageError> {
        if role == Role::Tool && tool_call_id.as_deref().is_none_or(str::is_empty) {
            return Err(MessageError::MissingToolCallId);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id,
        })
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::unchecked(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::unchecked(Role::Assistant, content.into())
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::assistant(content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::unchecked(Role::System, content.into())
    }

    /// Create a tool result message. Fails when `tool_call_id` is empty.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, MessageError> {
        Self::new(Role::Tool, content, Some(tool_call_id.into()))
    }

    /// Whether the model asked for any tool to run.
    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    // Only for roles that carry no tool_call_id invariant.
    fn unchecked(role: Role, content: String) -> Self {
        debug_assert!(role != Role::Tool);
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// Wire shape of a message before validation.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    role: Role,
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    tool_call_id: Option<String>,
}

impl TryFrom<RawMessage> for Message {
    type Error = MessageError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let mut msg = Message::new(raw.role, raw.content, raw.tool_call_id)?;
        if let Some(id) = raw.id {
            msg.id = id;
        }
        if let Some(ts) = raw.timestamp {
            msg.timestamp = ts;
        }
        msg.tool_calls = raw.tool_calls.unwrap_or_default();
        Ok(msg)
    }
}
