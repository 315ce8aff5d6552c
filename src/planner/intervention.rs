use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::types::*;
use crate::config::PlannerConfig;
use crate::context::{ContextSnapshot, Severity};
use crate::error::PlanningError;
use crate::services::llm::{Impact, Opportunity, ReasoningJudgment, StoryHealth, StructuralConcern};

/// A concern or opportunity before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub origin: CandidateOrigin,
    pub kind: InterventionKind,
    pub level: PriorityLevel,
    pub score: f32,
    pub confidence: f32,
    pub what: String,
    pub why: String,
    pub target: Option<TargetHint>,
}

/// Result of ranking: what made it in and why the rest did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub selected: Vec<Candidate>,
    pub below_threshold: usize,
    pub over_capacity: usize,
}

/// PLAN step. Pure apart from stamping the creation time.
pub struct InterventionPlanner {
    config: PlannerConfig,
}

impl InterventionPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn plan(
        &self,
        cycle_id: Uuid,
        judgment: &ReasoningJudgment,
        snapshot: &ContextSnapshot,
    ) -> Result<InterventionPlan, PlanningError> {
        let mut plan = InterventionPlan {
            cycle_id,
            story_id: snapshot.story_id.clone(),
            trigger_event: snapshot.trigger.event_name.clone(),
            interventions: Vec::new(),
            rationale: String::new(),
            exclusion_note: None,
            overall_story_health: judgment.overall_story_health,
            confidence: judgment.confidence,
            status: PlanStatus::Planned,
            questions_for_writer: judgment
                .open_questions
                .iter()
                .take(self.config.max_questions)
                .cloned()
                .collect(),
            created_at: Utc::now(),
        };

        if judgment.confidence <= 0.0 {
            plan.confidence = 0.0;
            plan.status = PlanStatus::ReasoningUnavailable;
            plan.rationale = "Reasoning was unavailable this cycle; no interventions were planned.".to_string();
            return Ok(plan);
        }

        let candidates = self.candidates(judgment, snapshot);
        if candidates.is_empty() {
            plan.status = PlanStatus::Healthy;
            plan.rationale = healthy_rationale(judgment);
            return Ok(plan);
        }

        let total = candidates.len();
        let ranking = rank(candidates, &self.config)?;
        debug!(
            candidates = total,
            selected = ranking.selected.len(),
            below_threshold = ranking.below_threshold,
            over_capacity = ranking.over_capacity,
            "candidates ranked"
        );

        if ranking.selected.is_empty() {
            plan.status = PlanStatus::LowConfidence;
            plan.rationale = format!(
                "Low confidence: all {} candidate interventions fell below the minimum confidence of {:.2}.",
                total, self.config.min_confidence
            );
            return Ok(plan);
        }

        plan.exclusion_note = exclusion_note(&ranking, self.config.max_suggestions);
        plan.rationale = planned_rationale(judgment, &ranking.selected);
        plan.interventions = ranking
            .selected
            .into_iter()
            .enumerate()
            .map(|(i, c)| PlannedIntervention {
                priority: i as u32 + 1,
                level: c.level,
                score: c.score,
                kind: c.kind,
                origin: c.origin,
                what: c.what,
                why: c.why,
                target: c.target,
                confidence: c.confidence,
            })
            .collect();
        Ok(plan)
    }

    /// One candidate per concern, then one per opportunity, in list order.
    pub fn candidates(&self, judgment: &ReasoningJudgment, snapshot: &ContextSnapshot) -> Vec<Candidate> {
        let concerns = judgment
            .structural_concerns
            .iter()
            .map(|c| self.from_concern(c, judgment.confidence, snapshot));
        let opportunities = judgment
            .opportunities
            .iter()
            .map(|o| self.from_opportunity(o, judgment.confidence, snapshot));
        concerns.chain(opportunities).collect()
    }

    fn from_concern(&self, concern: &StructuralConcern, confidence: f32, snapshot: &ContextSnapshot) -> Candidate {
        Candidate {
            origin: CandidateOrigin::StructuralConcern,
            kind: InterventionKind::StructuralAdjustment,
            level: match concern.severity {
                Severity::Critical => PriorityLevel::Critical,
                Severity::Major => PriorityLevel::High,
                Severity::Moderate => PriorityLevel::Medium,
                Severity::Minor => PriorityLevel::Low,
            },
            score: concern.severity.rank() as f32 * self.config.concern_weight,
            confidence,
            what: concern
                .recommendation
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| format!("Address: {}", concern.concern)),
            why: concern.concern.clone(),
            target: target_hint(concern.affected_scenes.first(), snapshot),
        }
    }

    fn from_opportunity(&self, opp: &Opportunity, confidence: f32, snapshot: &ContextSnapshot) -> Candidate {
        let what = if opp.description.trim().is_empty() {
            opp.rationale.clone()
        } else {
            opp.description.clone()
        };
        let why = if opp.rationale.trim().is_empty() {
            format!("Opportunity with {:?} estimated impact", opp.estimated_impact).to_lowercase()
        } else {
            opp.rationale.clone()
        };
        Candidate {
            origin: CandidateOrigin::Opportunity,
            kind: InterventionKind::from_opportunity_type(&opp.kind),
            level: match opp.estimated_impact {
                Impact::High => PriorityLevel::High,
                Impact::Medium => PriorityLevel::Medium,
                Impact::Low => PriorityLevel::Low,
            },
            score: opp.estimated_impact.rank() as f32 * self.config.opportunity_weight,
            confidence: opp.confidence.unwrap_or(confidence).min(confidence),
            what,
            why,
            target: target_hint(opp.related_scenes.first(), snapshot),
        }
    }
}

/// Stable descending sort by score, then confidence floor, then capacity.
pub fn rank(mut candidates: Vec<Candidate>, config: &PlannerConfig) -> Result<Ranking, PlanningError> {
    if config.max_suggestions == 0 {
        return Err(PlanningError::ZeroCapacity);
    }
    if let Some((index, c)) = candidates.iter().enumerate().find(|(_, c)| !c.score.is_finite()) {
        return Err(PlanningError::NonFiniteScore { index, score: c.score });
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let before = candidates.len();
    candidates.retain(|c| c.confidence >= config.min_confidence);
    let below_threshold = before - candidates.len();

    let over_capacity = candidates.len().saturating_sub(config.max_suggestions);
    candidates.truncate(config.max_suggestions);

    Ok(Ranking { selected: candidates, below_threshold, over_capacity })
}

fn target_hint(scene: Option<&String>, snapshot: &ContextSnapshot) -> Option<TargetHint> {
    let chapter = snapshot.progress.chapter.known().copied();
    let scene = scene
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .or_else(|| snapshot.progress.scene_id.known().cloned());
    if chapter.is_none() && scene.is_none() {
        return None;
    }
    Some(TargetHint { chapter, scene })
}

fn healthy_rationale(judgment: &ReasoningJudgment) -> String {
    let health = match judgment.overall_story_health {
        StoryHealth::Excellent => "excellent",
        StoryHealth::Good => "good",
        StoryHealth::NeedsAttention => "in need of attention",
        StoryHealth::Critical => "critical",
        StoryHealth::Unknown => "not assessed",
    };
    match &judgment.health_reasoning {
        Some(reason) if !reason.trim().is_empty() => format!(
            "No structural concerns or opportunities identified; overall health is {}. {}",
            health, reason
        ),
        _ => format!(
            "No structural concerns or opportunities identified; overall health is {}. The story is on track.",
            health
        ),
    }
}

fn planned_rationale(judgment: &ReasoningJudgment, selected: &[Candidate]) -> String {
    let concerns = selected.iter().filter(|c| c.origin == CandidateOrigin::StructuralConcern).count();
    let opportunities = selected.len() - concerns;
    let mut out = format!(
        "{} structural concern(s) and {} opportunity(ies) selected at confidence {:.2}.",
        concerns, opportunities, judgment.confidence
    );
    if let Some(reason) = judgment.health_reasoning.as_deref().filter(|r| !r.trim().is_empty()) {
        out.push(' ');
        out.push_str(reason);
    }
    out
}

fn exclusion_note(ranking: &Ranking, max: usize) -> Option<String> {
    let mut parts = Vec::new();
    if ranking.below_threshold > 0 {
        parts.push(format!("{} below the confidence floor", ranking.below_threshold));
    }
    if ranking.over_capacity > 0 {
        parts.push(format!("{} deferred by the per-cycle limit of {}", ranking.over_capacity, max));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("Excluded: {}.", parts.join("; ")))
    }
}
