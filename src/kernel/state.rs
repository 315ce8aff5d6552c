use serde::{Deserialize, Serialize};

/// Explicit lifecycle of one reasoning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    #[default]
    Received,
    /// OBSERVE
    Aggregating,
    /// INTERPRET
    Interpreting,
    /// REASON. The only stage that suspends.
    Reasoning,
    /// PLAN
    Planning,
    Complete,
    /// Reached only through a component defect. Network and model
    /// failures are absorbed before this point.
    Failed,
}

impl CycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Complete | CycleState::Failed)
    }
}

/// Requests to move the cycle forward. The graph validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStep {
    Begin,
    ContextReady,
    InsightsReady,
    JudgmentReady,
    PlanReady,
    Defect,
}

pub struct CycleGraph;

impl CycleGraph {
    /// Pure function: (Current State, Step) -> New State.
    /// Returns None for a transition the cycle must never take.
    pub fn transition(current: CycleState, step: CycleStep) -> Option<CycleState> {
        use CycleState::*;
        use CycleStep::*;

        match (current, step) {
            (Received, Begin) => Some(Aggregating),
            (Aggregating, ContextReady) => Some(Interpreting),
            (Interpreting, InsightsReady) => Some(Reasoning),
            (Reasoning, JudgmentReady) => Some(Planning),
            (Planning, PlanReady) => Some(Complete),

            // Any live stage may fail on a defect; terminal states stay put.
            (state, Defect) if !state.is_terminal() => Some(Failed),

            _ => None,
        }
    }
}
