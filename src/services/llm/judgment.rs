use serde::{Deserialize, Deserializer, Serialize};

use crate::context::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumStatus {
    Healthy,
    Stalling,
    Rushing,
    Unstable,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcHealth {
    Excellent,
    Good,
    NeedsWork,
    Problematic,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTrend {
    Building,
    Plateauing,
    Dissipating,
    Volatile,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReinforcementQuality {
    Strong,
    Moderate,
    Weak,
    Absent,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Overall story health as judged by the model. Copied verbatim into the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryHealth {
    Excellent,
    Good,
    NeedsAttention,
    Critical,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    #[default]
    Medium,
    High,
}

impl Impact {
    pub fn rank(self) -> u8 {
        match self {
            Impact::Low => 1,
            Impact::Medium => 2,
            Impact::High => 3,
        }
    }
}

// Models write severities and impacts as free text. Unrecognised values
// read as moderate severity and medium impact.
fn lenient_severity<'de, D: Deserializer<'de>>(d: D) -> Result<Severity, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.as_deref().and_then(Severity::parse).unwrap_or(Severity::Moderate))
}

fn lenient_impact<'de, D: Deserializer<'de>>(d: D) -> Result<Impact, D::Error> {
    let raw = Option::<String>::deserialize(d)?.unwrap_or_default().to_ascii_lowercase();
    Ok(if raw.contains("high") || raw.contains("major") || raw.contains("significant") {
        Impact::High
    } else if raw.contains("low") || raw.contains("minor") || raw.contains("small") {
        Impact::Low
    } else {
        Impact::Medium
    })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MomentumAssessment {
    #[serde(default)]
    pub status: MomentumStatus,
    #[serde(default, alias = "evidence", alias = "senior_writer_intuition")]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterArcAssessment {
    #[serde(default)]
    pub overall_arc_health: ArcHealth,
    #[serde(default)]
    pub characters_at_risk: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionalTrajectory {
    #[serde(default)]
    pub trend: EmotionalTrend,
    #[serde(default)]
    pub current_state: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThematicHealth {
    #[serde(default)]
    pub themes_present: Vec<String>,
    #[serde(default)]
    pub reinforcement_quality: ReinforcementQuality,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralConcern {
    #[serde(alias = "description")]
    pub concern: String,
    #[serde(default = "default_severity", deserialize_with = "lenient_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub affected_scenes: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

fn default_severity() -> Severity {
    Severity::Moderate
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default, alias = "specific_suggestion")]
    pub description: String,
    #[serde(default, alias = "why")]
    pub rationale: String,
    #[serde(
        default,
        alias = "expected_impact",
        alias = "impact",
        deserialize_with = "lenient_impact"
    )]
    pub estimated_impact: Impact,
    /// The model's own confidence in this opportunity, when it gives one.
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub related_scenes: Vec<String>,
}

/// The model's structured narrative assessment for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningJudgment {
    #[serde(default, alias = "momentum_assessment")]
    pub momentum: MomentumAssessment,
    #[serde(default, alias = "character_arc_assessment")]
    pub character_arcs: CharacterArcAssessment,
    #[serde(default)]
    pub emotional_trajectory: EmotionalTrajectory,
    #[serde(default)]
    pub structural_concerns: Vec<StructuralConcern>,
    #[serde(default)]
    pub thematic_health: ThematicHealth,
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
    #[serde(default, alias = "questions_for_writer")]
    pub open_questions: Vec<String>,
    #[serde(default)]
    pub overall_story_health: StoryHealth,
    #[serde(default, alias = "overall_health_reasoning")]
    pub health_reasoning: Option<String>,
    /// Always present. 0.0 marks a fallback judgment.
    #[serde(alias = "reasoning_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u32>,
}

impl ReasoningJudgment {
    /// Deterministic neutral judgment used when the model cannot be reached
    /// or understood.
    pub fn fallback() -> Self {
        Self {
            momentum: MomentumAssessment::default(),
            character_arcs: CharacterArcAssessment::default(),
            emotional_trajectory: EmotionalTrajectory::default(),
            structural_concerns: Vec::new(),
            thematic_health: ThematicHealth::default(),
            opportunities: Vec::new(),
            open_questions: Vec::new(),
            overall_story_health: StoryHealth::Unknown,
            health_reasoning: None,
            confidence: 0.0,
            model: None,
            tokens_used: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == 0.0
    }

    /// Range checks serde cannot express.
    pub fn check_ranges(&self) -> Result<(), String> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0, 1]", self.confidence));
        }
        for (i, opp) in self.opportunities.iter().enumerate() {
            if let Some(c) = opp.confidence {
                if !c.is_finite() || !(0.0..=1.0).contains(&c) {
                    return Err(format!("opportunity {} confidence {} outside [0, 1]", i, c));
                }
            }
        }
        Ok(())
    }
}
