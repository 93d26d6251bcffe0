//! In-process stimulus queue: two FIFOs behind one lock.

use chrono::Utc;
use recollect_core::event::{DomainEvent, EventBus};
use recollect_core::message::Message;
use recollect_core::stimulus::{Stimulus, StimulusQueue};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct Tiers {
    priority: VecDeque<Stimulus>,
    normal: VecDeque<Stimulus>,
}

/// Priority stimuli drain before normal ones; each tier is FIFO.
///
/// The lock is only held for the push or pop itself, so producers on other
/// tasks never wait on a running cycle.
#[derive(Default)]
pub struct FifoStimulusQueue {
    tiers: Mutex<Tiers>,
}

impl FifoStimulusQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tiers> {
        // A producer that panicked mid-push leaves the deques intact.
        self.tiers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StimulusQueue for FifoStimulusQueue {
    fn enqueue(&self, stimulus: Stimulus) {
        let mut tiers = self.lock();
        if stimulus.priority {
            tiers.priority.push_back(stimulus);
        } else {
            tiers.normal.push_back(stimulus);
        }
        debug!(
            priority = tiers.priority.len(),
            normal = tiers.normal.len(),
            "Stimulus enqueued"
        );
    }

    fn dequeue(&self) -> Option<Message> {
        let mut tiers = self.lock();
        tiers
            .priority
            .pop_front()
            .or_else(|| tiers.normal.pop_front())
            .map(|s| s.message)
    }

    fn is_pending(&self, tag: &str) -> bool {
        let tiers = self.lock();
        tiers
            .priority
            .iter()
            .chain(tiers.normal.iter())
            .any(|s| s.tag.as_deref() == Some(tag))
    }

    fn len(&self) -> usize {
        let tiers = self.lock();
        tiers.priority.len() + tiers.normal.len()
    }
}

/// Producer side of the queue, shared by the agent and its handles.
/// Publishes a [`DomainEvent::StimulusEnqueued`] for every stimulus.
#[derive(Clone)]
pub struct Inbox {
    queue: Arc<dyn StimulusQueue>,
    events: Arc<EventBus>,
}

impl Inbox {
    pub fn new(queue: Arc<dyn StimulusQueue>, events: Arc<EventBus>) -> Self {
        Self { queue, events }
    }

    pub fn enqueue(&self, stimulus: Stimulus) {
        let priority = stimulus.priority;
        self.queue.enqueue(stimulus);
        self.events.publish(DomainEvent::StimulusEnqueued {
            priority,
            timestamp: Utc::now(),
        });
    }

    pub fn queue(&self) -> &Arc<dyn StimulusQueue> {
        &self.queue
    }
}
