use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::state::CycleState;
use crate::planner::PlanStatus;
use crate::services::llm::FallbackReason;

// Allowed: ids, states, categories, counts, durations
// Forbidden: scene text, prompts, model output, intervention text

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    StageEntered {
        cycle_id: Uuid,
        state: CycleState,
        elapsed_ms: u64,
    },

    ReasoningAttemptFailed {
        cycle_id: Uuid,
        attempt: u32,
        category: String,
        retry_delay_ms: Option<u64>,
    },

    FallbackUsed {
        cycle_id: Uuid,
        reason: FallbackReason,
    },

    PlanEmitted {
        cycle_id: Uuid,
        status: PlanStatus,
        interventions: usize,
        duration_ms: u64,
    },

    CycleFailed {
        cycle_id: Uuid,
        at: CycleState,
    },
}
