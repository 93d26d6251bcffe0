//! Domain event system: decoupled observation of the control loop.
//!
//! Events are published when a cycle finishes or is skipped, when history
//! is evicted, when a stimulus is queued, and when a tool runs. Anything can
//! subscribe without the loop knowing about it.

use crate::agent::CycleKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A cycle ran to completion
    CycleCompleted {
        cycle: CycleKind,
        tool_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// A cycle was abandoned after a failed generation
    CycleSkipped {
        cycle: CycleKind,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Messages left core memory for the recall tier
    MessagesEvicted {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A stimulus entered the queue
    StimulusEnqueued {
        priority: bool,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
