//! Shared test doubles for the agent tests.

use async_trait::async_trait;
use recollect_core::error::{InferenceError, MemoryError, ToolError};
use recollect_core::inference::{GenerationRequest, InferenceBackend, InferenceLimits};
use recollect_core::memory::{MemoryItem, MemoryTier, MemoryTierKind, SearchPage};
use recollect_core::message::{Message, ToolCall};
use recollect_core::tool::{Tool, ToolResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted answer of [`SequentialMockBackend`].
pub enum Scripted {
    Reply(Message),
    Fail(InferenceError),
    /// Never answers (until an hour passes)
    Hang,
}

pub fn reply(text: &str) -> Scripted {
    Scripted::Reply(Message::assistant(text))
}

pub fn tool_reply(text: &str, calls: Vec<ToolCall>) -> Scripted {
    Scripted::Reply(Message::assistant_with_tools(text, calls))
}

/// A tool call with a predictable id: `call_<name>`.
pub fn tool_call(name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::with_id(format!("call_{name}"), name, args)
}

/// An inference backend that answers from a script, then with "Noted.".
///
/// Records every request it receives.
pub struct SequentialMockBackend {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerationRequest>>,
    limits: InferenceLimits,
}

impl SequentialMockBackend {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            limits: InferenceLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: InferenceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for SequentialMockBackend {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    fn limits(&self) -> InferenceLimits {
        self.limits
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Message, InferenceError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            None => Ok(Message::assistant("Noted.")),
            Some(Scripted::Reply(message)) => Ok(message),
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Message::assistant("too late"))
            }
        }
    }
}

/// A tier that records each `write` call separately.
pub struct RecordingTier {
    kind: MemoryTierKind,
    writes: Mutex<Vec<Vec<MemoryItem>>>,
}

impl RecordingTier {
    pub fn new(kind: MemoryTierKind) -> Self {
        Self {
            kind,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Contents of each write call, in call order.
    pub fn writes(&self) -> Vec<Vec<String>> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|batch| batch.iter().map(|i| i.content().to_string()).collect())
            .collect()
    }
}

#[async_trait]
impl MemoryTier for RecordingTier {
    fn name(&self) -> &str {
        "recording"
    }

    fn kind(&self) -> MemoryTierKind {
        self.kind
    }

    async fn write(&self, items: Vec<MemoryItem>) -> Result<(), MemoryError> {
        self.writes.lock().unwrap().push(items);
        Ok(())
    }

    async fn search(&self, query: &str, page: usize) -> Result<SearchPage, MemoryError> {
        Ok(SearchPage::paginate(Vec::new(), query, page, 10))
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.writes.lock().unwrap().iter().map(Vec::len).sum())
    }
}

/// A user tool whose handler always raises.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "flaky_lookup"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "flaky_lookup".into(),
            reason: "upstream unavailable".into(),
        })
    }
}
