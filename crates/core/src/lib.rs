//! # Recollect Core
//!
//! Domain types, traits, and error definitions for the Recollect agent loop.
//! This crate has **no runtime dependencies** beyond serialization and
//! channels. It defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (inference backend, memory tier, prompt
//! renderer, stimulus queue, tool) is a trait here. Implementations live in
//! their own crates, so tests can swap in scripted doubles.

pub mod agent;
pub mod core_memory;
pub mod error;
pub mod event;
pub mod inference;
pub mod memory;
pub mod message;
pub mod prompt;
pub mod stimulus;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentState, CycleKind};
pub use core_memory::{CoreEdit, CoreEditError, CoreMemory, Segment};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use inference::{GenerationIntent, GenerationRequest, InferenceBackend, InferenceLimits};
pub use memory::{CoreStore, Document, MemoryItem, MemoryTier, MemoryTierKind, SearchPage};
pub use message::{Message, Role, ToolCall, ToolCallFunction};
pub use prompt::PromptRenderer;
pub use stimulus::{Stimulus, StimulusQueue};
pub use tool::{Tool, ToolCatalog, ToolDefinition, ToolResult, ToolTier};
