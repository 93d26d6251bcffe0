//! Handlebars-backed prompt rendering for Recollect.
//!
//! Ships a default template for every name in
//! [`recollect_core::prompt::templates`]. A templates directory can override
//! any of them with a `<name>.hbs` file, or add new ones.

pub mod templates;

use handlebars::Handlebars;
use recollect_core::core_memory::CoreMemory;
use recollect_core::error::PromptError;
use recollect_core::inference::InferenceLimits;
use recollect_core::prompt::PromptRenderer;
use serde_json::json;
use std::path::Path;
use tracing::debug;

/// Renders templates with Handlebars. Output is plain text, never
/// HTML-escaped.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// A renderer holding only the built-in templates.
    pub fn new() -> Result<Self, PromptError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        for (name, source) in templates::BUILTIN {
            registry
                .register_template_string(name, source)
                .map_err(|e| PromptError::Render {
                    template: name.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Self { registry })
    }

    /// Built-ins, overridden by every `*.hbs` file in `dir`.
    pub fn with_overrides(dir: &Path) -> Result<Self, PromptError> {
        let mut renderer = Self::new()?;
        let entries = std::fs::read_dir(dir).map_err(|e| PromptError::Render {
            template: dir.display().to_string(),
            reason: format!("cannot read templates directory: {e}"),
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("hbs") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path).map_err(|e| PromptError::Render {
                template: name.to_string(),
                reason: e.to_string(),
            })?;
            renderer.register(name, &source)?;
            debug!(template = name, path = %path.display(), "Template override loaded");
        }
        Ok(renderer)
    }

    /// Register or replace a single template.
    pub fn register(&mut self, name: &str, source: &str) -> Result<(), PromptError> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| PromptError::Render {
                template: name.to_string(),
                reason: e.to_string(),
            })
    }
}

impl PromptRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, params: &serde_json::Value) -> Result<String, PromptError> {
        if !self.registry.has_template(template) {
            return Err(PromptError::TemplateNotFound(template.to_string()));
        }
        self.registry
            .render(template, params)
            .map_err(|e| PromptError::Render {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Parameters for the per-intent system prompts.
///
/// `recall_count` is the number of messages already moved to the recall
/// tier, so the model can tell how much history it cannot see.
pub fn core_params(
    core: &CoreMemory,
    limits: &InferenceLimits,
    recall_count: usize,
) -> serde_json::Value {
    json!({
        "boot": core.boot,
        "bios": core.bios,
        "persona": core.persona,
        "human": core.human,
        "persona_chars": core.persona.chars().count(),
        "persona_chars_limit": limits.max_persona_chars,
        "human_chars": core.human.chars().count(),
        "human_chars_limit": limits.max_human_chars,
        "total_chars": core.total_chars(),
        "total_chars_limit": limits.max_total_chars,
        "count_visible_messages": core.history.len(),
        "count_total_messages": core.history.len() + recall_count,
    })
}
