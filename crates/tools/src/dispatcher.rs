//! Tool dispatcher: turns a requested [`ToolCall`] into exactly one
//! tool-role [`Message`].
//!
//! Nothing escapes: lookup misses, argument mismatches, handler errors,
//! timeouts and panics all become an error message carrying the call's id.
//! Handlers run in a spawned task under a timeout so a hung or crashing
//! tool cannot stall the loop.

use crate::search_tools::{self, SEARCH_TOOLS};
use recollect_core::core_memory::CoreMemory;
use recollect_core::error::ToolError;
use recollect_core::message::{Message, ToolCall};
use recollect_core::tool::{Tool, ToolCatalog, ToolDefinition, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// The outcome of dispatching one call.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// Tool-role message answering the call
    pub message: Message,
    pub tool_name: String,
    pub success: bool,
    pub duration: Duration,
}

/// Executes tool calls against a [`ToolCatalog`].
///
/// Also owns catalog reduction state: the definitions last offered to the
/// model (searched by `search_tools`) and the names pinned by the last search.
pub struct Dispatcher {
    timeout: Duration,
    max_result_chars: usize,
    offered: Vec<ToolDefinition>,
    pinned: Vec<String>,
}

impl Dispatcher {
    pub fn new(timeout: Duration, max_result_chars: usize) -> Self {
        Self {
            timeout,
            max_result_chars,
            offered: Vec::new(),
            pinned: Vec::new(),
        }
    }

    /// Shape `offered` for a backend that accepts at most `max_tool_count`
    /// definitions. Remembers the full list for `search_tools`.
    pub fn present(&mut self, offered: Vec<ToolDefinition>, max_tool_count: usize) -> Vec<ToolDefinition> {
        let presented = search_tools::reduce(&offered, &self.pinned, max_tool_count);
        if presented.len() < offered.len() {
            debug!(
                offered = offered.len(),
                presented = presented.len(),
                pinned = self.pinned.len(),
                "Tool catalog reduced"
            );
        }
        self.offered = offered;
        presented
    }

    /// Names pinned by the last `search_tools` call.
    pub fn pinned(&self) -> &[String] {
        &self.pinned
    }

    /// Run one call. Core memory edits returned by the tool are applied to
    /// `core` all together, or not at all.
    pub async fn dispatch(
        &mut self,
        catalog: &ToolCatalog,
        core: &mut CoreMemory,
        call: &ToolCall,
    ) -> Dispatched {
        let started = Instant::now();
        let tool_name = call.name().to_string();
        debug!(tool = %tool_name, call_id = %call.id, "Dispatching tool call");

        let outcome = match catalog.resolve(&tool_name) {
            Some((_, tool)) => self.run(tool, call, core).await,
            None if tool_name == SEARCH_TOOLS => self.search(call),
            None => Err(ToolError::NotFound(tool_name.clone())),
        };

        let (success, content) = match outcome {
            Ok(result) if result.success => (true, result.output),
            Ok(result) => {
                warn!(tool = %tool_name, output = %result.output, "Tool reported failure");
                (false, result.output)
            }
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Tool call failed");
                (false, format!("Error: {e}"))
            }
        };

        Dispatched {
            message: tool_message(&call.id, self.truncate(content)),
            tool_name,
            success,
            duration: started.elapsed(),
        }
    }

    async fn run(
        &self,
        tool: Arc<dyn Tool>,
        call: &ToolCall,
        core: &mut CoreMemory,
    ) -> Result<ToolResult, ToolError> {
        let arguments = Value::Object(call.function.arguments.clone());
        validate_arguments(&tool.parameters_schema(), &arguments)?;

        let result = self.execute_with_guards(call.name(), tool, arguments).await?;
        if result.edits.is_empty() {
            return Ok(result);
        }

        let mut edited = core.clone();
        for edit in &result.edits {
            edited
                .apply(edit)
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: call.name().to_string(),
                    reason: e.to_string(),
                })?;
        }
        *core = edited;
        Ok(result)
    }

    /// Execute a tool in a spawned task with timeout and panic isolation.
    async fn execute_with_guards(
        &self,
        name: &str,
        tool: Arc<dyn Tool>,
        arguments: Value,
    ) -> Result<ToolResult, ToolError> {
        let timeout = self.timeout;
        let handle =
            tokio::task::spawn(async move { tokio::time::timeout(timeout, tool.execute(arguments)).await });

        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ToolError::Timeout {
                tool_name: name.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
            Err(join_err) if join_err.is_panic() => {
                error!(tool = %name, "Tool panicked: {:?}", join_err);
                Err(ToolError::Panicked(name.to_string()))
            }
            Err(_) => Err(ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: "task was cancelled".into(),
            }),
        }
    }

    fn search(&mut self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let query = call
            .function
            .arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let hits = search_tools::rank(&self.offered, query, search_tools::MAX_HITS);
        if hits.is_empty() {
            return Ok(ToolResult::ok(format!("No tools matched '{query}'.")));
        }

        let mut output = String::from("These tools will be available on your next turn:\n");
        for def in &hits {
            output.push_str(&format!("- {}: {}\n", def.name, def.description));
        }
        self.pinned = hits.into_iter().map(|d| d.name.clone()).collect();
        Ok(ToolResult::ok(output))
    }

    fn truncate(&self, content: String) -> String {
        let total = content.chars().count();
        if total <= self.max_result_chars {
            return content;
        }
        let kept: String = content.chars().take(self.max_result_chars).collect();
        format!(
            "{kept}\n... [truncated {} characters]",
            total - self.max_result_chars
        )
    }
}

/// Check arguments against the schema's `required` list and the declared
/// primitive types of supplied properties.
fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), ToolError> {
    let Some(args) = arguments.as_object() else {
        return Err(ToolError::InvalidArguments("arguments must be an object".into()));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(name) {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required parameter '{name}'"
                )));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, value) in args {
            let Some(expected) = properties
                .get(name)
                .and_then(|p| p.get("type"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let matches = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !matches {
                return Err(ToolError::InvalidArguments(format!(
                    "parameter '{name}' must be of type {expected}"
                )));
            }
        }
    }

    Ok(())
}

/// A tool-role message. An empty incoming id is replaced, since a tool
/// message without one cannot exist.
fn tool_message(call_id: &str, content: String) -> Message {
    let call_id = if call_id.trim().is_empty() {
        let generated = format!("call_{}", Uuid::new_v4().simple());
        warn!(generated = %generated, "Tool call arrived without an id");
        generated
    } else {
        call_id.to_string()
    };

    match Message::tool_result(call_id, content.as_str()) {
        Ok(message) => message,
        // The id is non-empty by now; kept so a tool result is never lost.
        Err(e) => {
            error!(error = %e, "Tool result rejected, delivering it as a system message");
            Message::system(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recollect_core::core_memory::{CoreEdit, Segment};
    use recollect_core::message::Role;
    use recollect_core::tool::ToolTier;
    use serde_json::json;

    struct StaticTool {
        name: &'static str,
        description: &'static str,
        behavior: Behavior,
    }

    #[derive(Clone)]
    enum Behavior {
        Echo,
        Fail,
        Panic,
        Hang,
        Huge,
        Edit(Vec<CoreEdit>),
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            self.description
        }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
            match &self.behavior {
                Behavior::Echo => Ok(ToolResult::ok(arguments["text"].as_str().unwrap_or(""))),
                Behavior::Fail => Err(ToolError::ExecutionFailed {
                    tool_name: self.name.into(),
                    reason: "disk on fire".into(),
                }),
                Behavior::Panic => panic!("handler blew up"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ToolResult::ok("never"))
                }
                Behavior::Huge => Ok(ToolResult::ok("x".repeat(50))),
                Behavior::Edit(edits) => {
                    let mut result = ToolResult::ok("edited");
                    result.edits = edits.clone();
                    Ok(result)
                }
            }
        }
    }

    fn tool(name: &'static str, behavior: Behavior) -> Arc<dyn Tool> {
        Arc::new(StaticTool {
            name,
            description: "test tool",
            behavior,
        })
    }

    fn catalog_with(name: &'static str, behavior: Behavior) -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        catalog.register(ToolTier::User, tool(name, behavior));
        catalog
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Duration::from_secs(5), 1000)
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::with_id("call_1", name, args)
    }

    #[tokio::test]
    async fn success_produces_tool_message() {
        let catalog = catalog_with("echo", Behavior::Echo);
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("echo", json!({ "text": "hi" })))
            .await;

        assert!(out.success);
        assert_eq!(out.message.role, Role::Tool);
        assert_eq!(out.message.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(out.message.content, "hi");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_message() {
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(&ToolCatalog::new(), &mut core, &call("nope", json!({})))
            .await;
        assert!(!out.success);
        assert_eq!(out.message.tool_call_id.as_deref(), Some("call_1"));
        assert!(out.message.content.contains("not found"));
    }

    #[tokio::test]
    async fn failing_handler_becomes_error_message() {
        let catalog = catalog_with("broken", Behavior::Fail);
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("broken", json!({ "text": "x" })))
            .await;
        assert!(!out.success);
        assert_eq!(out.message.role, Role::Tool);
        assert!(!out.message.tool_call_id.as_deref().unwrap_or("").is_empty());
        assert!(out.message.content.contains("disk on fire"));
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let catalog = catalog_with("bomb", Behavior::Panic);
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("bomb", json!({ "text": "x" })))
            .await;
        assert!(!out.success);
        assert!(out.message.content.contains("crashed"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_handler_times_out() {
        let catalog = catalog_with("slow", Behavior::Hang);
        let mut core = CoreMemory::default();
        let out = Dispatcher::new(Duration::from_secs(2), 1000)
            .dispatch(&catalog, &mut core, &call("slow", json!({ "text": "x" })))
            .await;
        assert!(!out.success);
        assert!(out.message.content.contains("timed out"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let catalog = catalog_with("echo", Behavior::Echo);
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("echo", json!({ "other": 1 })))
            .await;
        assert!(!out.success);
        assert!(out.message.content.contains("missing required parameter 'text'"));
    }

    #[tokio::test]
    async fn mistyped_argument_is_rejected() {
        let catalog = catalog_with("echo", Behavior::Echo);
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("echo", json!({ "text": 42 })))
            .await;
        assert!(!out.success);
        assert!(out.message.content.contains("must be of type string"));
    }

    #[tokio::test]
    async fn long_output_is_truncated() {
        let catalog = catalog_with("big", Behavior::Huge);
        let mut core = CoreMemory::default();
        let out = Dispatcher::new(Duration::from_secs(5), 20)
            .dispatch(&catalog, &mut core, &call("big", json!({ "text": "x" })))
            .await;
        assert!(out.message.content.starts_with(&"x".repeat(20)));
        assert!(out.message.content.ends_with("[truncated 30 characters]"));
    }

    #[tokio::test]
    async fn empty_call_id_still_yields_tool_message() {
        let catalog = catalog_with("echo", Behavior::Echo);
        let mut core = CoreMemory::default();
        let out = dispatcher()
            .dispatch(
                &catalog,
                &mut core,
                &ToolCall::with_id("", "echo", json!({ "text": "hi" })),
            )
            .await;
        assert_eq!(out.message.role, Role::Tool);
        assert!(out.message.tool_call_id.unwrap().starts_with("call_"));
    }

    #[tokio::test]
    async fn tool_messages_pass_message_validation() {
        let catalog = catalog_with("echo", Behavior::Echo);
        let mut core = CoreMemory::default();
        let mut d = dispatcher();
        for id in ["call_1", "", "   "] {
            let out = d
                .dispatch(
                    &catalog,
                    &mut core,
                    &ToolCall::with_id(id, "echo", json!({ "text": "hi" })),
                )
                .await;
            let json = serde_json::to_string(&out.message).unwrap();
            let back: Message = serde_json::from_str(&json).unwrap();
            assert_eq!(back.role, Role::Tool);
            assert!(!back.tool_call_id.unwrap().trim().is_empty());
        }
    }

    #[tokio::test]
    async fn edits_apply_to_core() {
        let catalog = catalog_with(
            "edit",
            Behavior::Edit(vec![CoreEdit::ReplaceSegment {
                segment: Segment::Human,
                content: "Name: Sam".into(),
            }]),
        );
        let mut core = CoreMemory::new("", "", "", "unknown");
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("edit", json!({ "text": "x" })))
            .await;
        assert!(out.success);
        assert_eq!(core.human, "Name: Sam");
    }

    #[tokio::test]
    async fn failed_edit_leaves_core_untouched() {
        let catalog = catalog_with(
            "edit",
            Behavior::Edit(vec![
                CoreEdit::ReplaceSegment {
                    segment: Segment::Human,
                    content: "changed".into(),
                },
                CoreEdit::ReplaceInSegment {
                    segment: Segment::Persona,
                    old_content: "absent".into(),
                    new_content: "x".into(),
                },
            ]),
        );
        let mut core = CoreMemory::new("", "", "calm", "original");
        let out = dispatcher()
            .dispatch(&catalog, &mut core, &call("edit", json!({ "text": "x" })))
            .await;
        assert!(!out.success);
        assert!(out.message.content.contains("not found in the persona segment"));
        assert_eq!(core.human, "original");
    }

    #[tokio::test]
    async fn search_tools_pins_hits_for_next_presentation() {
        let mut catalog = ToolCatalog::new();
        for name in ["alpha", "beta", "gamma", "weather_lookup"] {
            catalog.register(ToolTier::User, tool(name, Behavior::Echo));
        }
        let mut core = CoreMemory::default();
        let mut dispatcher = Dispatcher::new(Duration::from_secs(5), 1000);

        let first = dispatcher.present(catalog.thought_definitions(), 3);
        let first_names: Vec<_> = first.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(first_names, vec!["alpha", "beta", SEARCH_TOOLS]);

        let out = dispatcher
            .dispatch(&catalog, &mut core, &call(SEARCH_TOOLS, json!({ "query": "weather" })))
            .await;
        assert!(out.success);
        assert!(out.message.content.contains("weather_lookup"));
        assert_eq!(dispatcher.pinned(), ["weather_lookup".to_string()]);

        let second = dispatcher.present(catalog.thought_definitions(), 3);
        let second_names: Vec<_> = second.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(second_names, vec!["weather_lookup", "alpha", SEARCH_TOOLS]);
    }
}
