use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingInsight {
    Accelerating,
    Steady,
    Decelerating,
    Stalling,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStage {
    EarlySetup,
    WorldEstablishment,
    RisingAction,
    ClimaxApproach,
    ClimaxAndResolution,
    FinalPolish,
    Unknown,
}

impl NarrativeStage {
    /// `completion` is a ratio in [0, 1].
    pub fn from_completion(completion: f32) -> Self {
        let pct = completion * 100.0;
        if pct < 20.0 {
            NarrativeStage::EarlySetup
        } else if pct < 40.0 {
            NarrativeStage::WorldEstablishment
        } else if pct < 60.0 {
            NarrativeStage::RisingAction
        } else if pct < 80.0 {
            NarrativeStage::ClimaxApproach
        } else if pct < 95.0 {
            NarrativeStage::ClimaxAndResolution
        } else {
            NarrativeStage::FinalPolish
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    Pacing,
    CharacterDevelopment,
    Continuity,
    ThematicDevelopment,
    PlotManagement,
    RelationshipDynamics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterHealth {
    Healthy,
    NeedsAttention,
    Concerning,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuityStatus {
    Clean,
    MinorIssues,
    MajorIssues,
    CriticalIssues,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterEngagement {
    NewWriter,
    HighlyEngaged,
    ModeratelyEngaged,
    LowEngagement,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextQuality {
    Excellent,
    Good,
    Moderate,
    Limited,
}

/// Deterministic reading of a snapshot, computed before the model is asked
/// anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub pacing: PacingInsight,
    /// 0.0 to 1.0, 0.5 when nothing is known.
    pub arc_completion: f32,
    /// 0.0 to 1.0, 0.5 when nothing is known.
    pub thematic_consistency: f32,
    pub stage: NarrativeStage,
    pub focus_areas: Vec<FocusArea>,
    pub character_health: CharacterHealth,
    pub continuity_status: ContinuityStatus,
    pub writer_engagement: WriterEngagement,
    pub context_quality: ContextQuality,
    pub key_insights: Vec<String>,
}

impl Insights {
    pub const NEUTRAL_SCORE: f32 = 0.5;

    /// What a snapshot with no usable signal reads as.
    pub fn neutral() -> Self {
        Self {
            pacing: PacingInsight::Unknown,
            arc_completion: Self::NEUTRAL_SCORE,
            thematic_consistency: Self::NEUTRAL_SCORE,
            stage: NarrativeStage::Unknown,
            focus_areas: Vec::new(),
            character_health: CharacterHealth::NoData,
            continuity_status: ContinuityStatus::Unknown,
            writer_engagement: WriterEngagement::Unknown,
            context_quality: ContextQuality::Limited,
            key_insights: Vec::new(),
        }
    }
}
