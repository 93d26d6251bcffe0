//! The Recollect agent loop.
//!
//! An [`Agent`] owns core memory and runs two kinds of cycles on a shared
//! heartbeat:
//!
//! - **Thinking**: fold one pending stimulus into core memory, ask the model
//!   for a thought, dispatch the tools it requests and queue their results.
//! - **Maintenance**: show the model its memory pressure and let it
//!   reorganize core memory with the OS tools.
//!
//! [`AgentRuntime`] drives both cadences on a single task; [`AgentHandle`]
//! lets other tasks feed it stimuli and run cycles on demand.

pub mod agent;
pub mod builder;
pub mod queue;
pub mod runtime;
pub mod schedule;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::{Agent, AgentSnapshot, CycleReport, resize_tag};
pub use builder::AgentBuilder;
pub use queue::{FifoStimulusQueue, Inbox};
pub use runtime::{AgentHandle, AgentRuntime};
pub use schedule::HeartbeatSchedule;
