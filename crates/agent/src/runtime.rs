//! The heartbeat runtime: one task that owns the [`Agent`] and drives both
//! cadences from a fixed tick.
//!
//! Cycles never overlap: scheduled cycles and commanded ones all run on the
//! runtime task, one at a time. Producers talk to it through an
//! [`AgentHandle`], which can enqueue without waiting for a cycle to end.

use crate::agent::{Agent, AgentSnapshot, CycleReport};
use crate::queue::Inbox;
use recollect_core::error::{Error, Result};
use recollect_core::event::{DomainEvent, EventBus};
use recollect_core::message::Message;
use recollect_core::stimulus::Stimulus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

enum Command {
    RunThinking(oneshot::Sender<CycleReport>),
    RunMaintenance(oneshot::Sender<CycleReport>),
    Snapshot(oneshot::Sender<AgentSnapshot>),
}

pub struct AgentRuntime {
    agent: Agent,
    tick: Duration,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
}

impl AgentRuntime {
    /// Wrap `agent`, checking the schedule every `tick`.
    pub fn new(agent: Agent, tick: Duration) -> (Self, AgentHandle) {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = AgentHandle {
            inbox: agent.inbox().clone(),
            events: Arc::clone(agent.events()),
            commands: tx,
            cancel: cancel.clone(),
        };
        let runtime = Self {
            agent,
            tick,
            commands: rx,
            cancel,
        };
        (runtime, handle)
    }

    pub fn spawn(self) -> JoinHandle<Agent> {
        tokio::spawn(self.run())
    }

    /// Tick until cancelled, then hand the agent back.
    pub async fn run(mut self) -> Agent {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            instance_id = %self.agent.instance_id(),
            tick_ms = self.tick.as_millis() as u64,
            heartrate_secs = self.agent.schedule().heartrate().as_secs(),
            "Heartbeat started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(command) = self.commands.recv() => self.handle(command).await,
                _ = interval.tick() => {
                    let reports = self.agent.tick().await;
                    if !reports.is_empty() {
                        debug!(cycles = reports.len(), "Tick ran cycles");
                    }
                }
            }
        }

        info!(instance_id = %self.agent.instance_id(), "Heartbeat stopped");
        self.agent
    }

    async fn handle(&mut self, command: Command) {
        // A caller that stopped waiting just doesn't get the reply.
        match command {
            Command::RunThinking(reply) => {
                let _ = reply.send(self.agent.run_thinking().await);
            }
            Command::RunMaintenance(reply) => {
                let _ = reply.send(self.agent.run_maintenance().await);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.agent.snapshot());
            }
        }
    }
}

/// A cloneable handle onto a running [`AgentRuntime`].
#[derive(Clone)]
pub struct AgentHandle {
    inbox: Inbox,
    events: Arc<EventBus>,
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
}

impl AgentHandle {
    /// Queue a user message for the next thinking cycle.
    pub fn send_message(&self, content: impl Into<String>) {
        self.inbox.enqueue(Stimulus::normal(Message::user(content)));
    }

    pub fn enqueue(&self, stimulus: Stimulus) {
        self.inbox.enqueue(stimulus);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.events.subscribe()
    }

    /// Run a thinking cycle now, after any cycle already in progress.
    pub async fn run_thinking(&self) -> Result<CycleReport> {
        self.request(Command::RunThinking).await
    }

    pub async fn run_maintenance(&self) -> Result<CycleReport> {
        self.request(Command::RunMaintenance).await
    }

    pub async fn snapshot(&self) -> Result<AgentSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Stop the runtime once the current cycle finishes.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.commands.is_closed()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())
    }
}

fn stopped() -> Error {
    Error::Internal("agent runtime is not running".into())
}
