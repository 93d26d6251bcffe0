//! The agent: exclusive owner of core memory, and the two heartbeat cycles
//! that mutate it.
//!
//! ## Thinking cycle
//!
//! 1. Memory-pressure check (may queue a priority resize stimulus)
//! 2. Fold at most one stimulus into core memory; evictions go to recall
//! 3. Generate with the thought catalog (user + backend tools)
//! 4. Fold the response; evictions go to recall
//! 5. Dispatch requested tools in order, queue each result, force thinking
//!
//! ## Maintenance cycle
//!
//! Generate with the memory-pressure intent and the full catalog, dispatch
//! requested tools, queue their results. Never forces thinking.
//!
//! A failed or timed-out generation skips the rest of the cycle. Whatever
//! was already folded stays folded; the next due-time retries.

use crate::queue::Inbox;
use crate::schedule::HeartbeatSchedule;
use chrono::Utc;
use recollect_core::agent::{AgentState, CycleKind};
use recollect_core::core_memory::{CoreMemory, Segment};
use recollect_core::error::{Error, InferenceError};
use recollect_core::event::{DomainEvent, EventBus};
use recollect_core::inference::{GenerationIntent, GenerationRequest, InferenceBackend};
use recollect_core::memory::MemoryItem;
use recollect_core::message::{Message, ToolCall};
use recollect_core::prompt::{PromptRenderer, templates};
use recollect_core::stimulus::Stimulus;
use recollect_core::tool::{ToolCatalog, ToolDefinition};
use recollect_memory::MemoryTiers;
use recollect_tools::Dispatcher;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub kind: CycleKind,
    /// Tool calls dispatched
    pub tool_calls: usize,
    /// Generation failed or timed out
    pub skipped: bool,
}

/// A point-in-time copy of the agent, for observers.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub instance_id: String,
    pub core: CoreMemory,
    pub state: AgentState,
    pub queued: usize,
}

pub struct Agent {
    instance_id: String,
    core: CoreMemory,
    inference: Arc<dyn InferenceBackend>,
    renderer: Arc<dyn PromptRenderer>,
    inbox: Inbox,
    memory: MemoryTiers,
    catalog: ToolCatalog,
    dispatcher: Dispatcher,
    schedule: HeartbeatSchedule,
    inference_timeout: Duration,
    events: Arc<EventBus>,
    state: AgentState,
}

/// Everything an [`Agent`] is made of. Assembled by the builder.
pub(crate) struct AgentParts {
    pub instance_id: String,
    pub core: CoreMemory,
    pub inference: Arc<dyn InferenceBackend>,
    pub renderer: Arc<dyn PromptRenderer>,
    pub inbox: Inbox,
    pub memory: MemoryTiers,
    pub catalog: ToolCatalog,
    pub dispatcher: Dispatcher,
    pub schedule: HeartbeatSchedule,
    pub inference_timeout: Duration,
    pub events: Arc<EventBus>,
}

impl Agent {
    pub(crate) fn from_parts(parts: AgentParts) -> Self {
        Self {
            instance_id: parts.instance_id,
            core: parts.core,
            inference: parts.inference,
            renderer: parts.renderer,
            inbox: parts.inbox,
            memory: parts.memory,
            catalog: parts.catalog,
            dispatcher: parts.dispatcher,
            schedule: parts.schedule,
            inference_timeout: parts.inference_timeout,
            events: parts.events,
            state: AgentState::default(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn core(&self) -> &CoreMemory {
        &self.core
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn schedule(&self) -> &HeartbeatSchedule {
        &self.schedule
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            instance_id: self.instance_id.clone(),
            core: self.core.clone(),
            state: self.state.clone(),
            queued: self.inbox.queue().len(),
        }
    }

    /// Run whichever cadences are due. Both may run in the same tick,
    /// thinking first.
    pub async fn tick(&mut self) -> Vec<CycleReport> {
        let now = Instant::now();
        let mut reports = Vec::new();
        if self.schedule.thinking_due(now) {
            reports.push(self.run_thinking().await);
        }
        if self.schedule.maintenance_due(now) {
            reports.push(self.run_maintenance().await);
        }
        reports
    }

    /// Run a thinking cycle now and advance its due-time.
    pub async fn run_thinking(&mut self) -> CycleReport {
        let report = self.thinking_cycle().await;
        self.schedule.thinking_ran(Instant::now());
        if report.tool_calls > 0 {
            // Tool results are queued; fold them without waiting a heartbeat.
            self.schedule.force_thinking();
        }
        report
    }

    /// Run a maintenance cycle now and advance its due-time.
    pub async fn run_maintenance(&mut self) -> CycleReport {
        let report = self.maintenance_cycle().await;
        self.schedule.maintenance_ran(Instant::now());
        report
    }

    async fn thinking_cycle(&mut self) -> CycleReport {
        let cycle = CycleKind::Thinking;
        debug!(cycle = %cycle, queued = self.inbox.queue().len(), "Cycle started");

        self.check_memory_pressure();

        match self.inbox.queue().dequeue() {
            Some(stimulus) => {
                debug!(role = %stimulus.role, "Folding stimulus into core memory");
                self.fold(stimulus).await;
            }
            None => debug!("No stimulus pending"),
        }

        let offered = self.catalog.thought_definitions();
        let response = match self.generate(GenerationIntent::Thought, offered).await {
            Ok(response) => response,
            Err(e) => return self.skip(cycle, e).await,
        };

        let calls = response.tool_calls.clone();
        self.fold(response).await;
        let tool_calls = self.dispatch_all(&calls).await;
        self.finish(cycle, tool_calls).await
    }

    async fn maintenance_cycle(&mut self) -> CycleReport {
        let cycle = CycleKind::Maintenance;
        debug!(cycle = %cycle, "Cycle started");

        let offered = self.catalog.os_definitions();
        let response = match self.generate(GenerationIntent::MemoryPressure, offered).await {
            Ok(response) => response,
            Err(e) => return self.skip(cycle, e).await,
        };

        let tool_calls = self.dispatch_all(&response.tool_calls).await;
        self.finish(cycle, tool_calls).await
    }

    /// Queue one priority resize stimulus per overflowing segment, unless one
    /// for that segment is still pending. Returns how many were queued.
    pub fn check_memory_pressure(&self) -> usize {
        let limits = self.inference.limits();
        let mut queued = 0;

        for segment in Segment::ALL {
            let max_chars = limits.segment_limit(segment);
            if !self.core.segment_overflow(segment, max_chars) {
                continue;
            }

            let tag = resize_tag(segment);
            if self.inbox.queue().is_pending(&tag) {
                debug!(segment = %segment, "Resize already pending");
                continue;
            }

            let chars = self.core.segment_chars(segment);
            let params = serde_json::json!({
                "segment": segment.as_str(),
                "max_chars": max_chars,
                "chars": chars,
            });
            let content = self
                .renderer
                .render(templates::CORE_MEMORY_RESIZE, &params)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Resize template failed, using plain notice");
                    format!(
                        "The {segment} segment of core memory is over its limit of {max_chars} characters. Shorten it."
                    )
                });

            info!(segment = %segment, chars, max_chars, "Core memory segment over limit");
            self.inbox
                .enqueue(Stimulus::priority(Message::system(content)).with_tag(tag));
            queued += 1;
        }
        queued
    }

    /// Append to history, forwarding evictions to recall in one write.
    async fn fold(&mut self, message: Message) {
        let max_history = self.inference.limits().max_history_messages;
        let evicted = self.core.append_and_evict(message, max_history);
        if evicted.is_empty() {
            return;
        }

        let count = evicted.len();
        debug!(evicted = count, "Forwarding evicted messages to recall");
        let items = evicted.into_iter().map(MemoryItem::from).collect();
        if let Err(e) = self.memory.recall.write(items).await {
            warn!(error = %e, evicted = count, "Recall write failed, evicted messages lost");
        }

        self.state.messages_evicted += count as u64;
        self.events.publish(DomainEvent::MessagesEvicted {
            count,
            timestamp: Utc::now(),
        });
    }

    async fn generate(
        &mut self,
        intent: GenerationIntent,
        offered: Vec<ToolDefinition>,
    ) -> Result<Message, Error> {
        let limits = self.inference.limits();
        let tools = self.dispatcher.present(offered, limits.max_tool_count);

        let recall_count = match self.memory.recall.count().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Could not count recall memory");
                0
            }
        };
        let params = recollect_prompt::core_params(&self.core, &limits, recall_count);
        let system_prompt = self.renderer.render(intent.template(), &params)?;

        let request = GenerationRequest {
            intent,
            system_prompt,
            core: self.core.clone(),
            tools,
        };

        let timeout_secs = self.inference_timeout.as_secs();
        let response = tokio::time::timeout(self.inference_timeout, self.inference.generate(request))
            .await
            .map_err(|_| InferenceError::Timeout { timeout_secs })??;
        Ok(response)
    }

    /// Dispatch in order, queueing each result as a normal stimulus.
    async fn dispatch_all(&mut self, calls: &[ToolCall]) -> usize {
        for call in calls {
            let outcome = self
                .dispatcher
                .dispatch(&self.catalog, &mut self.core, call)
                .await;
            self.events.publish(DomainEvent::ToolExecuted {
                tool_name: outcome.tool_name,
                success: outcome.success,
                duration_ms: outcome.duration.as_millis() as u64,
                timestamp: Utc::now(),
            });
            self.inbox.enqueue(Stimulus::normal(outcome.message));
        }
        calls.len()
    }

    async fn skip(&mut self, cycle: CycleKind, error: Error) -> CycleReport {
        warn!(cycle = %cycle, error = %error, "Generation failed, skipping cycle");
        self.state.skipped_cycles += 1;
        self.events.publish(DomainEvent::CycleSkipped {
            cycle,
            reason: error.to_string(),
            timestamp: Utc::now(),
        });
        self.persist().await;
        CycleReport {
            kind: cycle,
            tool_calls: 0,
            skipped: true,
        }
    }

    async fn finish(&mut self, cycle: CycleKind, tool_calls: usize) -> CycleReport {
        self.persist().await;
        self.state.record_cycle(cycle, tool_calls);
        self.events.publish(DomainEvent::CycleCompleted {
            cycle,
            tool_calls,
            timestamp: Utc::now(),
        });
        info!(
            cycle = %cycle,
            tool_calls,
            history = self.core.history.len(),
            "Cycle completed"
        );
        CycleReport {
            kind: cycle,
            tool_calls,
            skipped: false,
        }
    }

    async fn persist(&self) {
        if let Err(e) = self.memory.core.save(&self.core).await {
            warn!(error = %e, store = self.memory.core.name(), "Failed to persist core memory");
        }
    }
}

/// Dedup key of a segment's resize stimulus.
pub fn resize_tag(segment: Segment) -> String {
    format!("resize:{segment}")
}
