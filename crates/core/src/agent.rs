//! Cycle kinds and runtime state of the agent.

use serde::{Deserialize, Serialize};

/// The two kinds of heartbeat cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    /// Fold one stimulus, generate, dispatch tools
    Thinking,
    /// Review memory pressure with the full tool catalog
    Maintenance,
}

impl std::fmt::Display for CycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleKind::Thinking => f.write_str("thinking"),
            CycleKind::Maintenance => f.write_str("maintenance"),
        }
    }
}

/// Runtime counters of the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Thinking cycles that ran to completion
    pub thinking_cycles: u64,

    /// Maintenance cycles that ran to completion
    pub maintenance_cycles: u64,

    /// Cycles abandoned because inference failed or timed out
    pub skipped_cycles: u64,

    /// Tool calls dispatched since startup
    pub tool_calls: u64,

    /// Messages moved from core memory to the recall tier
    pub messages_evicted: u64,
}

impl AgentState {
    /// Record a completed cycle.
    pub fn record_cycle(&mut self, kind: CycleKind, tool_calls: usize) {
        match kind {
            CycleKind::Thinking => self.thinking_cycles += 1,
            CycleKind::Maintenance => self.maintenance_cycles += 1,
        }
        self.tool_calls += tool_calls as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_state_starts_idle() {
        let state = AgentState::default();
        assert_eq!(state.thinking_cycles, 0);
        assert_eq!(state.skipped_cycles, 0);
    }

    #[test]
    fn record_cycle_counts_by_kind() {
        let mut state = AgentState::default();
        state.record_cycle(CycleKind::Thinking, 2);
        state.record_cycle(CycleKind::Maintenance, 1);
        state.record_cycle(CycleKind::Thinking, 0);
        assert_eq!(state.thinking_cycles, 2);
        assert_eq!(state.maintenance_cycles, 1);
        assert_eq!(state.tool_calls, 3);
    }
}
