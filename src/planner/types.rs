use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::llm::StoryHealth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    StructuralAdjustment,
    SceneAddition,
    CharacterMoment,
    ThematicReinforcement,
    DialogueAdjustment,
    RelationshipDevelopment,
    PacingAdjustment,
}

impl InterventionKind {
    /// Map a model-written opportunity type. Unrecognised types are treated
    /// as structural.
    pub fn from_opportunity_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "scene_addition" | "new_scene" => InterventionKind::SceneAddition,
            "character_moment" | "character_development" => InterventionKind::CharacterMoment,
            "thematic_echo" | "thematic_reinforcement" | "theme" => InterventionKind::ThematicReinforcement,
            "dialogue_refinement" | "dialogue_adjustment" | "dialogue" => InterventionKind::DialogueAdjustment,
            "relationship_development" | "relationship" => InterventionKind::RelationshipDevelopment,
            "pacing_adjustment" | "pacing" => InterventionKind::PacingAdjustment,
            _ => InterventionKind::StructuralAdjustment,
        }
    }
}

/// Which judgment list a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    StructuralConcern,
    Opportunity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedIntervention {
    /// 1 is the most important intervention of the plan.
    pub priority: u32,
    pub level: PriorityLevel,
    pub score: f32,
    pub kind: InterventionKind,
    pub origin: CandidateOrigin,
    pub what: String,
    pub why: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetHint>,
    pub confidence: f32,
}

/// Why a plan looks the way it does. Lets callers tell an empty healthy
/// plan from an empty degraded one without reading the rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Planned,
    Healthy,
    LowConfidence,
    ReasoningUnavailable,
}

/// Aggregate handed back to the caller once per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionPlan {
    pub cycle_id: Uuid,
    pub story_id: String,
    pub trigger_event: String,
    /// Highest priority first.
    pub interventions: Vec<PlannedIntervention>,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_note: Option<String>,
    pub overall_story_health: StoryHealth,
    /// 0.0 only when reasoning was unavailable.
    pub confidence: f32,
    pub status: PlanStatus,
    #[serde(default)]
    pub questions_for_writer: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlanBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl InterventionPlan {
    pub fn by_level(&self, level: PriorityLevel) -> impl Iterator<Item = &PlannedIntervention> {
        self.interventions.iter().filter(move |i| i.level == level)
    }

    pub fn breakdown(&self) -> PlanBreakdown {
        let mut b = PlanBreakdown::default();
        for i in &self.interventions {
            match i.level {
                PriorityLevel::Critical => b.critical += 1,
                PriorityLevel::High => b.high += 1,
                PriorityLevel::Medium => b.medium += 1,
                PriorityLevel::Low => b.low += 1,
            }
        }
        b
    }

    /// One-paragraph human summary of the plan.
    pub fn explain(&self) -> String {
        if self.interventions.is_empty() {
            return self.rationale.clone();
        }
        let b = self.breakdown();
        let mut parts = Vec::new();
        for (n, label) in [(b.critical, "critical"), (b.high, "high"), (b.medium, "medium"), (b.low, "low")] {
            if n > 0 {
                parts.push(format!("{} {}", n, label));
            }
        }
        let mut out = format!(
            "{} intervention(s) planned ({} priority). {}",
            self.interventions.len(),
            parts.join(", "),
            self.rationale
        );
        if let Some(note) = &self.exclusion_note {
            out.push(' ');
            out.push_str(note);
        }
        out
    }
}
