use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value an upstream feed may or may not have supplied.
/// Absence is explicit so downstream code never has to guess what a
/// missing number meant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Signal<T> {
    Known(T),
    Unknown,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Signal::Unknown
    }
}

impl<T> Signal<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Signal::Known(v) => Some(v),
            Signal::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Signal::Known(_))
    }
}

impl<T> From<Option<T>> for Signal<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Signal::Known(v),
            None => Signal::Unknown,
        }
    }
}

/// How a single upstream feed arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Present,
    #[default]
    Absent,
    /// The feed sent something we could not read. Treated as absent.
    Malformed,
}

impl SourceStatus {
    pub fn is_present(self) -> bool {
        self == SourceStatus::Present
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceReport {
    pub language: SourceStatus,
    pub graph: SourceStatus,
    pub continuity: SourceStatus,
    pub preferences: SourceStatus,
}

impl SourceReport {
    pub fn present_count(&self) -> usize {
        [self.language, self.graph, self.continuity, self.preferences]
            .iter()
            .filter(|s| s.is_present())
            .count()
    }
}

/// Severity shared by continuity flags and structural concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minor" | "low" => Some(Severity::Minor),
            "moderate" | "medium" => Some(Severity::Moderate),
            "major" | "high" => Some(Severity::Major),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Severity::Minor => 1,
            Severity::Moderate => 2,
            Severity::Major => 3,
            Severity::Critical => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoryProgress {
    pub title: Signal<String>,
    pub genre: Signal<String>,
    pub chapter: Signal<u32>,
    pub paragraph: Signal<u32>,
    pub scene_id: Signal<String>,
    pub act: Signal<u32>,
    /// 0.0 to 1.0
    pub completion_ratio: Signal<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingTrend {
    Accelerating,
    Steady,
    Decelerating,
    Stalling,
}

impl PacingTrend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accelerating" | "fast" | "rushing" => Some(PacingTrend::Accelerating),
            "steady" | "stable" => Some(PacingTrend::Steady),
            "decelerating" | "slowing" | "slow" => Some(PacingTrend::Decelerating),
            "stalling" | "stalled" => Some(PacingTrend::Stalling),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalDirection {
    Rising,
    Falling,
    Stable,
    Volatile,
}

impl EmotionalDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rising" | "building" => Some(EmotionalDirection::Rising),
            "falling" | "dissipating" => Some(EmotionalDirection::Falling),
            "stable" | "plateauing" => Some(EmotionalDirection::Stable),
            "volatile" => Some(EmotionalDirection::Volatile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    pub trend: PacingTrend,
    pub velocity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub label: Signal<String>,
    pub direction: Signal<EmotionalDirection>,
    /// 0.0 to 1.0
    pub intensity: Signal<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    /// 0.0 to 1.0
    pub consistency: Signal<f32>,
    pub notes: Vec<String>,
}

/// Narrative-language signals from the NLP extraction service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LanguageSignals {
    pub pacing: Signal<Pacing>,
    pub tone: Signal<Tone>,
    pub voice: Signal<Voice>,
    /// Tension per recent scene, oldest first. Values in [0, 1].
    pub tension_curve: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub developing: bool,
    pub stagnant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub recently_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub manifestations: u32,
    pub underutilized: bool,
}

/// Knowledge-graph state. Empty lists are legitimate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphState {
    pub characters: Vec<Character>,
    pub relationships: Vec<Relationship>,
    pub themes: Vec<Theme>,
    pub unresolved_threads: Vec<String>,
}

impl GraphState {
    pub fn stagnant_characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.stagnant)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityFlag {
    pub description: String,
    pub severity: Severity,
    pub category: Option<String>,
    pub scene_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinuityState {
    pub flags: Vec<ContinuityFlag>,
    pub flags_increasing: bool,
}

impl ContinuityState {
    pub fn count_at(&self, severity: Severity) -> usize {
        self.flags.iter().filter(|f| f.severity == severity).count()
    }
}

/// Writer history from the preference/recall store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriterPreferences {
    /// 0.0 to 1.0
    pub acceptance_rate: Signal<f32>,
    pub style_notes: Vec<String>,
    pub suggestions_received: u32,
    pub prefers_questions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMetadata {
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    pub urgency: Urgency,
}

/// The immutable aggregated input to one cycle.
///
/// Built once by the aggregator, then only ever read. Every upstream
/// field may be unknown; `story_id` and `trigger` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub story_id: String,
    pub progress: StoryProgress,
    pub language: LanguageSignals,
    pub graph: GraphState,
    pub continuity: ContinuityState,
    pub preferences: WriterPreferences,
    /// Oldest first, bounded by the aggregator.
    pub recent_scenes: Vec<String>,
    pub trigger: TriggerMetadata,
    pub sources: SourceReport,
    /// 0.0 to 1.0, how much usable data this cycle has.
    pub completeness: f32,
}
