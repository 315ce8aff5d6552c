use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::event::CycleRequest;
use super::state::{CycleGraph, CycleState, CycleStep};
use super::telemetry::{TelemetryEvent, TelemetryRecorder};
use crate::config::PipelineConfig;
use crate::context::ContextAggregator;
use crate::error::CycleError;
use crate::insight::InsightExtractor;
use crate::planner::{InterventionPlan, InterventionPlanner};
use crate::services::llm::{
    AttemptFailure, FallbackReason, JudgmentSource, ReasoningClient, ReasoningOutcome, ReasoningProvider,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMark {
    pub state: CycleState,
    pub elapsed_ms: u64,
}

/// Content-free record of how a cycle went.
#[derive(Debug, Clone, Serialize)]
pub struct CycleTrace {
    pub cycle_id: Uuid,
    pub stages: Vec<StageMark>,
    pub reasoning_source: Option<JudgmentSource>,
    pub attempts: u32,
    pub failures: Vec<AttemptFailure>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub plan: InterventionPlan,
    pub trace: CycleTrace,
}

/// Runs OBSERVE -> INTERPRET -> REASON -> PLAN for one trigger.
/// Holds no per-cycle state; any number of cycles may run concurrently
/// through a shared reference.
pub struct CycleOrchestrator {
    aggregator: ContextAggregator,
    extractor: InsightExtractor,
    reasoning: ReasoningClient,
    planner: InterventionPlanner,
    budget: Duration,
}

/// Per-cycle bookkeeping.
struct CycleRun<'a> {
    state: CycleState,
    started: Instant,
    trace: CycleTrace,
    telemetry: &'a mut TelemetryRecorder,
}

impl<'a> CycleRun<'a> {
    fn new(cycle_id: Uuid, telemetry: &'a mut TelemetryRecorder) -> Self {
        Self {
            state: CycleState::Received,
            started: Instant::now(),
            trace: CycleTrace {
                cycle_id,
                stages: vec![StageMark { state: CycleState::Received, elapsed_ms: 0 }],
                reasoning_source: None,
                attempts: 0,
                failures: Vec::new(),
                duration_ms: 0,
            },
            telemetry,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn advance(&mut self, step: CycleStep) -> Result<(), CycleError> {
        let next = CycleGraph::transition(self.state, step)
            .ok_or(CycleError::IllegalTransition { from: self.state, step })?;
        let elapsed_ms = self.elapsed_ms();
        debug!(from = ?self.state, to = ?next, elapsed_ms, "stage transition");
        self.state = next;
        self.trace.stages.push(StageMark { state: next, elapsed_ms });
        self.telemetry.record(TelemetryEvent::StageEntered {
            cycle_id: self.trace.cycle_id,
            state: next,
            elapsed_ms,
        });
        Ok(())
    }

    fn fail(&mut self) {
        let at = self.state;
        // Defect from a terminal state is itself impossible; keep the original state.
        if let Some(next) = CycleGraph::transition(self.state, CycleStep::Defect) {
            let elapsed_ms = self.elapsed_ms();
            self.state = next;
            self.trace.stages.push(StageMark { state: next, elapsed_ms });
        }
        self.telemetry.record(TelemetryEvent::CycleFailed { cycle_id: self.trace.cycle_id, at });
    }

    fn note_reasoning(&mut self, outcome: &ReasoningOutcome) {
        self.trace.reasoning_source = Some(outcome.source);
        self.trace.attempts = outcome.attempts;
        self.trace.failures = outcome.failures.clone();
        for f in &outcome.failures {
            self.telemetry.record(TelemetryEvent::ReasoningAttemptFailed {
                cycle_id: self.trace.cycle_id,
                attempt: f.attempt,
                category: f.category.to_string(),
                retry_delay_ms: f.delay.map(|d| d.as_millis() as u64),
            });
        }
        if let JudgmentSource::Fallback(reason) = outcome.source {
            self.telemetry.record(TelemetryEvent::FallbackUsed { cycle_id: self.trace.cycle_id, reason });
        }
    }
}

impl CycleOrchestrator {
    pub fn new(config: &PipelineConfig, provider: Arc<dyn ReasoningProvider>) -> Self {
        Self {
            aggregator: ContextAggregator::new(config.aggregator.clone()),
            extractor: InsightExtractor::new(),
            reasoning: ReasoningClient::new(provider, config.llm.clone(), config.retry.clone()),
            planner: InterventionPlanner::new(config.planner.clone()),
            budget: config.cycle.budget(),
        }
    }

    /// Run one cycle and return only the plan.
    pub async fn plan(&self, request: &CycleRequest) -> Result<InterventionPlan, CycleError> {
        let mut telemetry = TelemetryRecorder::new();
        Ok(self.run_cycle(request, &mut telemetry).await?.plan)
    }

    /// Run one cycle. Provider, parse and budget failures are absorbed into
    /// the plan; only component defects come back as `Err`.
    pub async fn run_cycle(
        &self,
        request: &CycleRequest,
        telemetry: &mut TelemetryRecorder,
    ) -> Result<CycleOutcome, CycleError> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!(
            "cycle",
            %cycle_id,
            story_id = %request.trigger.story_id,
            trigger = %request.trigger.event_name,
        );
        let mut run = CycleRun::new(cycle_id, telemetry);
        let result = self.drive(request, &mut run).instrument(span).await;
        if result.is_err() {
            run.fail();
        }
        result
    }

    async fn drive(&self, request: &CycleRequest, run: &mut CycleRun<'_>) -> Result<CycleOutcome, CycleError> {
        let deadline = run.started + self.budget;

        // OBSERVE
        run.advance(CycleStep::Begin)?;
        let snapshot = self.aggregator.aggregate(&request.trigger, &request.payloads);

        // INTERPRET
        run.advance(CycleStep::ContextReady)?;
        let insights = self.extractor.extract(&snapshot);

        // REASON
        run.advance(CycleStep::InsightsReady)?;
        let outcome = match tokio::time::timeout_at(deadline, self.reasoning.reason(&snapshot, &insights)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(budget_ms = self.budget.as_millis() as u64, "cycle budget exhausted during reasoning");
                ReasoningOutcome::fallback(FallbackReason::BudgetExhausted, 0, Vec::new())
            }
        };
        run.note_reasoning(&outcome);

        // PLAN
        run.advance(CycleStep::JudgmentReady)?;
        let plan = self.planner.plan(run.trace.cycle_id, &outcome.judgment, &snapshot)?;

        run.advance(CycleStep::PlanReady)?;
        let duration_ms = run.elapsed_ms();
        run.trace.duration_ms = duration_ms;
        run.telemetry.record(TelemetryEvent::PlanEmitted {
            cycle_id: run.trace.cycle_id,
            status: plan.status,
            interventions: plan.interventions.len(),
            duration_ms,
        });
        info!(
            status = ?plan.status,
            interventions = plan.interventions.len(),
            confidence = plan.confidence,
            duration_ms,
            "cycle complete"
        );

        Ok(CycleOutcome { plan, trace: run.trace.clone() })
    }
}
