//! Inbound shapes of the four upstream feeds.
//!
//! These mirror what the collaborating services send and are deliberately
//! loose: every field is optional, labels are free text, numbers may be out
//! of range. The aggregator turns them into the strict snapshot types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw feeds handed to a cycle. `None` means the collaborator had nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamPayloads {
    pub language: Option<Value>,
    pub graph: Option<Value>,
    pub continuity: Option<Value>,
    pub preferences: Option<Value>,
    /// Raw scene text, oldest first.
    pub recent_scenes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LanguagePayload {
    pub pacing: Option<PacingPayload>,
    pub tone: Option<TonePayload>,
    pub voice: Option<VoicePayload>,
    pub tension_curve: Vec<f32>,
}

/// Pacing arrives either as a bare label or as a detailed object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum PacingPayload {
    Label(String),
    Detailed {
        trend: Option<String>,
        velocity: Option<f32>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TonePayload {
    Label(String),
    Detailed {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        direction: Option<String>,
        #[serde(default)]
        intensity: Option<f32>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VoicePayload {
    pub consistency: Option<f32>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GraphPayload {
    pub characters: Vec<CharacterPayload>,
    pub relationships: Vec<RelationshipPayload>,
    pub themes: Vec<ThemePayload>,
    pub unresolved_plot_threads: Vec<String>,
    pub story_metadata: Option<StoryMetadataPayload>,
}

/// Characters may be sent as bare names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CharacterPayload {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        developing: bool,
        #[serde(default)]
        stagnant: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RelationshipPayload {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub recently_changed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ThemePayload {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        manifestations: u32,
        #[serde(default)]
        underutilized: bool,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StoryMetadataPayload {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub current_act: Option<u32>,
    pub current_chapter: Option<u32>,
    /// 0.0 to 1.0
    pub completion_ratio: Option<f32>,
    /// 0 to 100, accepted for older producers.
    pub completion_percentage: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ContinuityPayload {
    #[serde(alias = "active_flags")]
    pub flags: Vec<FlagPayload>,
    pub flags_increasing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlagPayload {
    Description(String),
    Detailed {
        #[serde(alias = "message")]
        description: String,
        #[serde(default)]
        severity: Option<String>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default, alias = "scene_id")]
        scene_ref: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PreferencesPayload {
    pub acceptance_rate: Option<f32>,
    pub style_notes: StyleNotesPayload,
    #[serde(alias = "total_suggestions_received")]
    pub suggestions_received: u32,
    #[serde(alias = "prefers_questions_over_suggestions")]
    pub prefers_questions: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StyleNotesPayload {
    One(String),
    Many(Vec<String>),
}

impl Default for StyleNotesPayload {
    fn default() -> Self {
        StyleNotesPayload::Many(Vec::new())
    }
}

impl StyleNotesPayload {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StyleNotesPayload::One(s) => vec![s],
            StyleNotesPayload::Many(v) => v,
        }
    }
}
