//! Stimuli: messages waiting to be folded into core memory.
//!
//! The queue has exactly two tiers: priority stimuli always drain before
//! normal ones, and each tier is FIFO. Producers (tool results, external
//! input, the memory-pressure check) may enqueue concurrently; the active
//! cycle is the single consumer. Dequeue never blocks.

use crate::message::Message;

/// A message waiting in the stimulus queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    pub message: Message,

    /// Jump ahead of every non-priority stimulus
    pub priority: bool,

    /// Optional dedup key (e.g. `resize:persona`) queryable while queued
    pub tag: Option<String>,
}

impl Stimulus {
    pub fn normal(message: Message) -> Self {
        Self {
            message,
            priority: false,
            tag: None,
        }
    }

    pub fn priority(message: Message) -> Self {
        Self {
            message,
            priority: true,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// The inbox of pending stimuli.
///
/// Implementations: in-process two-FIFO queue. Anything that can be shared
/// across tasks (`Send + Sync`) and never blocks on `dequeue` fits.
pub trait StimulusQueue: Send + Sync {
    /// Add a stimulus. Priority stimuli go behind existing priority stimuli
    /// and ahead of every normal one.
    fn enqueue(&self, stimulus: Stimulus);

    /// Take the next message, or `None` when empty.
    fn dequeue(&self) -> Option<Message>;

    /// Whether a stimulus carrying `tag` is still queued.
    fn is_pending(&self, tag: &str) -> bool;

    /// Number of queued stimuli across both tiers.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
