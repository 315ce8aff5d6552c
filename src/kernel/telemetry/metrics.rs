use std::collections::{HashSet, VecDeque};
use serde::Serialize;

use super::event::TelemetryEvent;
use crate::kernel::state::CycleState;
use crate::planner::PlanStatus;
use crate::services::llm::FallbackReason;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub cycle_stats: CycleStats,
    pub reasoning_stats: ReasoningStats,
    pub plan_stats: PlanStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleStats {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub total_duration_ms: u64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReasoningStats {
    pub failed_attempts: u64,
    pub rate_limited: u64,
    pub fallbacks: u64,
    pub budget_exhausted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanStats {
    pub emitted: u64,
    pub total_interventions: u64,
    pub avg_interventions: f64,
    pub healthy: u64,
    pub low_confidence: u64,
    pub unavailable: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut started = HashSet::new();

    for event in events {
        match event {
            TelemetryEvent::StageEntered { cycle_id, state, .. } => {
                if *state == CycleState::Aggregating && started.insert(*cycle_id) {
                    snap.cycle_stats.started += 1;
                }
            }
            TelemetryEvent::ReasoningAttemptFailed { category, .. } => {
                snap.reasoning_stats.failed_attempts += 1;
                if category == "rate_limited" {
                    snap.reasoning_stats.rate_limited += 1;
                }
            }
            TelemetryEvent::FallbackUsed { reason, .. } => {
                snap.reasoning_stats.fallbacks += 1;
                if *reason == FallbackReason::BudgetExhausted {
                    snap.reasoning_stats.budget_exhausted += 1;
                }
            }
            TelemetryEvent::PlanEmitted { status, interventions, duration_ms, .. } => {
                snap.cycle_stats.completed += 1;
                snap.cycle_stats.total_duration_ms += duration_ms;
                snap.cycle_stats.max_duration_ms = snap.cycle_stats.max_duration_ms.max(*duration_ms);

                snap.plan_stats.emitted += 1;
                snap.plan_stats.total_interventions += *interventions as u64;
                match status {
                    PlanStatus::Healthy => snap.plan_stats.healthy += 1,
                    PlanStatus::LowConfidence => snap.plan_stats.low_confidence += 1,
                    PlanStatus::ReasoningUnavailable => snap.plan_stats.unavailable += 1,
                    PlanStatus::Planned => {}
                }
            }
            TelemetryEvent::CycleFailed { .. } => snap.cycle_stats.failed += 1,
        }
    }

    // Compute Averages
    if snap.cycle_stats.completed > 0 {
        snap.cycle_stats.avg_duration_ms =
            snap.cycle_stats.total_duration_ms as f64 / snap.cycle_stats.completed as f64;
    }
    if snap.plan_stats.emitted > 0 {
        snap.plan_stats.avg_interventions =
            snap.plan_stats.total_interventions as f64 / snap.plan_stats.emitted as f64;
    }

    snap
}
