//! Prompt renderer trait: turns a named template plus parameters into text.
//!
//! Used to build the default core memory sections, the per-intent system
//! prompt, and corrective stimuli such as segment resize notices.

use crate::error::PromptError;

/// Well-known template names.
pub mod templates {
    pub const BOOT: &str = "boot";
    pub const BIOS: &str = "bios";
    pub const PERSONA: &str = "persona";
    pub const HUMAN: &str = "human";
    pub const THOUGHT: &str = "thought";
    pub const MEMORY_PRESSURE: &str = "memory_pressure";
    pub const CORE_MEMORY_RESIZE: &str = "core_memory_resize";
}

/// Renders templates. Must be deterministic per call.
pub trait PromptRenderer: Send + Sync {
    fn render(&self, template: &str, params: &serde_json::Value) -> Result<String, PromptError>;
}
