//! Tool trait and the layered tool catalog.
//!
//! Tools are registered under one of three origin tiers. When names collide
//! across tiers the more specific tier wins:
//! **user-defined > backend-defined > OS-defined**.
//!
//! The *thought* catalog (offered during a thinking cycle) holds the user and
//! backend tiers; the *OS* catalog (offered during maintenance) holds all three.

use crate::core_memory::CoreEdit;
use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Where a tool registration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTier {
    /// Registered by the deployment
    User,
    /// Contributed by the inference or memory backends
    Backend,
    /// Built-in memory management tools
    Os,
}

impl ToolTier {
    /// Tiers in precedence order.
    pub const PRECEDENCE: [ToolTier; 3] = [ToolTier::User, ToolTier::Backend, ToolTier::Os];

    fn index(self) -> usize {
        match self {
            ToolTier::User => 0,
            ToolTier::Backend => 1,
            ToolTier::Os => 2,
        }
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Core memory edits to apply once the tool returns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<CoreEdit>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn error(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn with_edit(mut self, edit: CoreEdit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The core Tool trait.
///
/// Tools are stateless from the loop's point of view: they receive the
/// call's arguments and return text. Tools that change core memory do so by
/// returning [`CoreEdit`]s, which the dispatcher applies after the call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "archive_content").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The three-tier catalog of registered tools.
#[derive(Default)]
pub struct ToolCatalog {
    tiers: [Vec<Arc<dyn Tool>>; 3],
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool in a tier. Replaces a same-named tool in that tier.
    pub fn register(&mut self, tier: ToolTier, tool: Arc<dyn Tool>) {
        let tools = &mut self.tiers[tier.index()];
        if let Some(pos) = tools.iter().position(|t| t.name() == tool.name()) {
            warn!(tool = %tool.name(), ?tier, "Replacing previously registered tool");
            tools[pos] = tool;
        } else {
            tools.push(tool);
        }
    }

    /// Resolve a tool name by precedence; first tier with a match wins.
    pub fn resolve(&self, name: &str) -> Option<(ToolTier, Arc<dyn Tool>)> {
        ToolTier::PRECEDENCE.iter().find_map(|tier| {
            self.tiers[tier.index()]
                .iter()
                .find(|t| t.name() == name)
                .map(|t| (*tier, Arc::clone(t)))
        })
    }

    /// Definitions from the given tiers in precedence order, registration
    /// order within a tier. A name shadowed by a higher tier appears once.
    pub fn definitions(&self, tiers: &[ToolTier]) -> Vec<ToolDefinition> {
        let mut seen = std::collections::HashSet::new();
        let mut defs = Vec::new();
        for tier in ToolTier::PRECEDENCE {
            if !tiers.contains(&tier) {
                continue;
            }
            for tool in &self.tiers[tier.index()] {
                if self.resolve(tool.name()).is_some_and(|(winner, _)| winner != tier) {
                    continue;
                }
                if seen.insert(tool.name().to_string()) {
                    defs.push(tool.to_definition());
                }
            }
        }
        defs
    }

    /// Tools offered during a thinking cycle (user + backend).
    pub fn thought_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions(&[ToolTier::User, ToolTier::Backend])
    }

    /// Tools offered during a maintenance cycle (every tier).
    pub fn os_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions(&ToolTier::PRECEDENCE)
    }

    /// Number of registrations across all tiers (shadowed ones included).
    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
