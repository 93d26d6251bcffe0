//! Heartbeat due-times for the thinking and maintenance cadences.
//!
//! Each cadence has its own due instant. `None` means due now: that is both
//! the initial state and what forcing a cadence sets.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct HeartbeatSchedule {
    heartrate: Duration,
    thinking_due: Option<Instant>,
    maintenance_due: Option<Instant>,
}

impl HeartbeatSchedule {
    /// Both cadences start due.
    pub fn new(heartrate: Duration) -> Self {
        Self {
            heartrate,
            thinking_due: None,
            maintenance_due: None,
        }
    }

    pub fn heartrate(&self) -> Duration {
        self.heartrate
    }

    pub fn thinking_due(&self, now: Instant) -> bool {
        self.thinking_due.is_none_or(|due| now >= due)
    }

    pub fn maintenance_due(&self, now: Instant) -> bool {
        self.maintenance_due.is_none_or(|due| now >= due)
    }

    /// When thinking next fires; `None` when it is due immediately.
    pub fn next_thinking(&self) -> Option<Instant> {
        self.thinking_due
    }

    pub fn next_maintenance(&self) -> Option<Instant> {
        self.maintenance_due
    }

    /// Thinking ran; next due one heartrate after `now`.
    pub fn thinking_ran(&mut self, now: Instant) {
        self.thinking_due = Some(now + self.heartrate);
    }

    /// Maintenance ran; next due one heartrate after `now`.
    pub fn maintenance_ran(&mut self, now: Instant) {
        self.maintenance_due = Some(now + self.heartrate);
    }

    /// Make thinking fire on the very next tick.
    pub fn force_thinking(&mut self) {
        self.thinking_due = None;
    }
}
