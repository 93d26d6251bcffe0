//! Inference backend trait: the abstraction over the language model.
//!
//! A backend couples a model with its serving endpoint. The loop hands it a
//! rendered snapshot of core memory plus the tools it may call, and gets one
//! completed message back. Backends also declare the limits the loop must
//! respect when shaping core memory and the tool catalog.

use crate::core_memory::{CoreMemory, Segment};
use crate::error::InferenceError;
use crate::message::Message;
use crate::tool::{Tool, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Limits a backend declares for the context it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceLimits {
    /// Maximum messages kept in core memory history
    pub max_history_messages: usize,

    /// Maximum characters across all of core memory
    pub max_total_chars: usize,

    /// Maximum characters in the persona segment
    pub max_persona_chars: usize,

    /// Maximum characters in the human segment
    pub max_human_chars: usize,

    /// Maximum tool definitions presented in one request
    pub max_tool_count: usize,
}

impl Default for InferenceLimits {
    fn default() -> Self {
        Self {
            max_history_messages: 100,
            max_total_chars: 64_000,
            max_persona_chars: 2_000,
            max_human_chars: 2_000,
            max_tool_count: 32,
        }
    }
}

impl InferenceLimits {
    /// Character limit of a bounded segment.
    pub fn segment_limit(&self, segment: Segment) -> usize {
        match segment {
            Segment::Persona => self.max_persona_chars,
            Segment::Human => self.max_human_chars,
        }
    }
}

/// Why a generation is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationIntent {
    /// Regular thinking: respond to whatever arrived
    Thought,
    /// Maintenance: review memory pressure and reorganize
    MemoryPressure,
}

impl GenerationIntent {
    /// Template that renders the system prompt for this intent.
    pub fn template(&self) -> &'static str {
        match self {
            GenerationIntent::Thought => "thought",
            GenerationIntent::MemoryPressure => "memory_pressure",
        }
    }
}

/// One request to the inference backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub intent: GenerationIntent,

    /// System prompt rendered from core memory for this intent
    pub system_prompt: String,

    /// Snapshot of core memory at request time
    pub core: CoreMemory,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl GenerationRequest {
    /// The prompt as a message list: the system prompt followed by history.
    pub fn messages(&self) -> Vec<Message> {
        std::iter::once(Message::system(&self.system_prompt))
            .chain(self.core.history.iter().cloned())
            .collect()
    }
}

/// The core InferenceBackend trait.
///
/// The loop calls `generate()` without knowing which model or transport is
/// behind it. One call per cycle, awaited to completion.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Context limits this backend accepts.
    fn limits(&self) -> InferenceLimits;

    /// Complete the request, returning the model's message.
    async fn generate(&self, request: GenerationRequest) -> Result<Message, InferenceError>;

    /// Tools this backend contributes to the backend tier.
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        Vec::new()
    }
}
