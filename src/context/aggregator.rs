use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::payload::*;
use super::types::*;
use crate::config::AggregatorConfig;
use crate::kernel::event::Trigger;

/// Decode one feed. Never fails: bad input is reported and replaced by absence.
fn decode_feed<T: DeserializeOwned>(feed: &'static str, payload: Option<&Value>) -> (Option<T>, SourceStatus) {
    match payload {
        None | Some(Value::Null) => (None, SourceStatus::Absent),
        Some(raw) => match T::deserialize(raw) {
            Ok(decoded) => (Some(decoded), SourceStatus::Present),
            Err(e) => {
                warn!(feed, error = %e, "Malformed upstream payload, treating feed as absent");
                (None, SourceStatus::Malformed)
            }
        },
    }
}

/// Clamp a ratio into [0, 1]; non-finite values become unknown.
fn unit(value: Option<f32>) -> Signal<f32> {
    match value {
        Some(v) if v.is_finite() => Signal::Known(v.clamp(0.0, 1.0)),
        _ => Signal::Unknown,
    }
}

fn non_blank(value: Option<String>) -> Signal<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Signal::Known(s.trim().to_string()),
        _ => Signal::Unknown,
    }
}

fn language_from(payload: Option<&Value>) -> (LanguageSignals, SourceStatus) {
    let (decoded, status) = decode_feed::<LanguagePayload>("language", payload);
    let Some(raw) = decoded else {
        return (LanguageSignals::default(), status);
    };

    let pacing: Signal<Pacing> = match raw.pacing {
        Some(PacingPayload::Label(label)) => PacingTrend::parse(&label)
            .map(|trend| Pacing { trend, velocity: 0.0 })
            .into(),
        Some(PacingPayload::Detailed { trend, velocity }) => trend
            .as_deref()
            .and_then(PacingTrend::parse)
            .map(|trend| Pacing {
                trend,
                velocity: velocity.filter(|v| v.is_finite()).unwrap_or(0.0),
            })
            .into(),
        None => Signal::Unknown,
    };

    let tone = match raw.tone {
        Some(TonePayload::Label(label)) => Signal::Known(Tone {
            label: non_blank(Some(label)),
            direction: Signal::Unknown,
            intensity: Signal::Unknown,
        }),
        Some(TonePayload::Detailed { label, direction, intensity }) => Signal::Known(Tone {
            label: non_blank(label),
            direction: direction.as_deref().and_then(EmotionalDirection::parse).into(),
            intensity: unit(intensity),
        }),
        None => Signal::Unknown,
    };

    let voice: Signal<Voice> = raw
        .voice
        .map(|v| Voice {
            consistency: unit(v.consistency),
            notes: v.notes,
        })
        .into();

    let tension_curve = raw
        .tension_curve
        .into_iter()
        .filter(|t| t.is_finite())
        .map(|t| t.clamp(0.0, 1.0))
        .collect();

    (LanguageSignals { pacing, tone, voice, tension_curve }, status)
}

fn graph_from(payload: Option<&Value>) -> (GraphState, Option<StoryMetadataPayload>, SourceStatus) {
    let (decoded, status) = decode_feed::<GraphPayload>("graph", payload);
    let Some(raw) = decoded else {
        return (GraphState::default(), None, status);
    };

    let characters = raw
        .characters
        .into_iter()
        .map(|c| match c {
            CharacterPayload::Name(name) => Character { name, developing: false, stagnant: false },
            CharacterPayload::Detailed { name, developing, stagnant } => Character { name, developing, stagnant },
        })
        .filter(|c| !c.name.trim().is_empty())
        .collect();

    let relationships = raw
        .relationships
        .into_iter()
        .map(|r| Relationship {
            source: r.source,
            target: r.target,
            kind: r.kind.unwrap_or_else(|| "unspecified".to_string()),
            recently_changed: r.recently_changed,
        })
        .collect();

    let themes = raw
        .themes
        .into_iter()
        .map(|t| match t {
            ThemePayload::Name(name) => Theme { name, manifestations: 0, underutilized: false },
            ThemePayload::Detailed { name, manifestations, underutilized } => Theme { name, manifestations, underutilized },
        })
        .filter(|t| !t.name.trim().is_empty())
        .collect();

    let graph = GraphState {
        characters,
        relationships,
        themes,
        unresolved_threads: raw.unresolved_plot_threads,
    };
    (graph, raw.story_metadata, status)
}

fn continuity_from(payload: Option<&Value>) -> (ContinuityState, SourceStatus) {
    let (decoded, status) = decode_feed::<ContinuityPayload>("continuity", payload);
    let Some(raw) = decoded else {
        return (ContinuityState::default(), status);
    };

    let flags = raw
        .flags
        .into_iter()
        .map(|f| match f {
            FlagPayload::Description(description) => ContinuityFlag {
                description,
                severity: Severity::Moderate,
                category: None,
                scene_ref: None,
            },
            FlagPayload::Detailed { description, severity, category, scene_ref } => ContinuityFlag {
                description,
                // Unlabelled flags are neither ignorable nor alarming.
                severity: severity.as_deref().and_then(Severity::parse).unwrap_or(Severity::Moderate),
                category,
                scene_ref,
            },
        })
        .collect();

    (ContinuityState { flags, flags_increasing: raw.flags_increasing }, status)
}

fn preferences_from(payload: Option<&Value>) -> (WriterPreferences, SourceStatus) {
    let (decoded, status) = decode_feed::<PreferencesPayload>("preferences", payload);
    let Some(raw) = decoded else {
        return (WriterPreferences::default(), status);
    };

    let prefs = WriterPreferences {
        acceptance_rate: unit(raw.acceptance_rate),
        style_notes: raw
            .style_notes
            .into_vec()
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect(),
        suggestions_received: raw.suggestions_received,
        prefers_questions: raw.prefers_questions,
    };
    (prefs, status)
}

/// Builder over the optional feeds of one cycle.
///
/// Each feed setter accepts whatever the collaborator sent and cannot fail.
/// `build` produces the immutable snapshot.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    trigger: Trigger,
    language: LanguageSignals,
    graph: GraphState,
    metadata: Option<StoryMetadataPayload>,
    continuity: ContinuityState,
    preferences: WriterPreferences,
    scenes: Vec<String>,
    max_recent_scenes: usize,
    sources: SourceReport,
}

impl ContextBuilder {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            language: LanguageSignals::default(),
            graph: GraphState::default(),
            metadata: None,
            continuity: ContinuityState::default(),
            preferences: WriterPreferences::default(),
            scenes: Vec::new(),
            max_recent_scenes: AggregatorConfig::default().max_recent_scenes,
            sources: SourceReport::default(),
        }
    }

    pub fn language(mut self, payload: Option<&Value>) -> Self {
        let (language, status) = language_from(payload);
        self.language = language;
        self.sources.language = status;
        self
    }

    pub fn graph(mut self, payload: Option<&Value>) -> Self {
        let (graph, metadata, status) = graph_from(payload);
        self.graph = graph;
        self.metadata = metadata;
        self.sources.graph = status;
        self
    }

    pub fn continuity(mut self, payload: Option<&Value>) -> Self {
        let (continuity, status) = continuity_from(payload);
        self.continuity = continuity;
        self.sources.continuity = status;
        self
    }

    pub fn preferences(mut self, payload: Option<&Value>) -> Self {
        let (preferences, status) = preferences_from(payload);
        self.preferences = preferences;
        self.sources.preferences = status;
        self
    }

    pub fn recent_scenes(mut self, scenes: Vec<String>) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn max_recent_scenes(mut self, max: usize) -> Self {
        self.max_recent_scenes = max;
        self
    }

    pub fn build(self) -> ContextSnapshot {
        let mut scenes: Vec<String> = self.scenes.into_iter().filter(|s| !s.trim().is_empty()).collect();
        if scenes.len() > self.max_recent_scenes {
            // Keep the most recent window; input is oldest first.
            let dropped = scenes.len() - self.max_recent_scenes;
            scenes.drain(..dropped);
            debug!(dropped, kept = scenes.len(), "Truncated recent scene window");
        }

        let progress = progress_from(&self.trigger, self.metadata);
        let urgency = assess_urgency(&self.continuity, &self.language);

        let mut snapshot = ContextSnapshot {
            story_id: self.trigger.story_id,
            progress,
            language: self.language,
            graph: self.graph,
            continuity: self.continuity,
            preferences: self.preferences,
            recent_scenes: scenes,
            trigger: TriggerMetadata {
                event_name: self.trigger.event_name,
                timestamp: self.trigger.timestamp,
                urgency,
            },
            sources: self.sources,
            completeness: 0.0,
        };
        snapshot.completeness = completeness(&snapshot);
        snapshot
    }
}

fn progress_from(trigger: &Trigger, metadata: Option<StoryMetadataPayload>) -> StoryProgress {
    let metadata = metadata.unwrap_or_default();
    let completion = metadata
        .completion_ratio
        .or(metadata.completion_percentage.map(|p| p / 100.0));

    StoryProgress {
        title: non_blank(metadata.title),
        genre: non_blank(metadata.genre),
        chapter: trigger.chapter.or(metadata.current_chapter).into(),
        paragraph: trigger.paragraph.into(),
        scene_id: non_blank(trigger.scene_id.clone()),
        act: metadata.current_act.into(),
        completion_ratio: unit(completion),
    }
}

/// Critical continuity always wins; stalled pacing or a pile of major flags
/// raise the cycle to high.
fn assess_urgency(continuity: &ContinuityState, language: &LanguageSignals) -> Urgency {
    if continuity.count_at(Severity::Critical) > 0 {
        return Urgency::Critical;
    }
    let stalling = language
        .pacing
        .known()
        .is_some_and(|p| p.trend == PacingTrend::Stalling);
    if stalling || continuity.count_at(Severity::Major) > 3 {
        return Urgency::High;
    }
    Urgency::Normal
}

fn completeness(snapshot: &ContextSnapshot) -> f32 {
    let checks = [
        snapshot.recent_scenes.len() >= 3,
        !snapshot.graph.characters.is_empty(),
        snapshot.sources.language.is_present(),
        snapshot.preferences.suggestions_received > 5,
        snapshot
            .progress
            .completion_ratio
            .known()
            .is_some_and(|c| *c > 0.10),
    ];
    checks.iter().filter(|ok| **ok).count() as f32 * 0.2
}

/// OBSERVE step: folds the four upstream feeds and recent scenes into a
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct ContextAggregator {
    config: AggregatorConfig,
}

impl ContextAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, trigger: &Trigger, payloads: &UpstreamPayloads) -> ContextSnapshot {
        let snapshot = ContextBuilder::new(trigger.clone())
            .max_recent_scenes(self.config.max_recent_scenes)
            .language(payloads.language.as_ref())
            .graph(payloads.graph.as_ref())
            .continuity(payloads.continuity.as_ref())
            .preferences(payloads.preferences.as_ref())
            .recent_scenes(payloads.recent_scenes.clone())
            .build();

        debug!(
            story_id = %snapshot.story_id,
            sources_present = snapshot.sources.present_count(),
            completeness = snapshot.completeness,
            "Context aggregated"
        );
        snapshot
    }
}
