#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use quill::config::PipelineConfig;
use quill::context::UpstreamPayloads;
use quill::services::llm::{Completion, CompletionRequest, ProviderError, ReasoningProvider};
use quill::{CycleRequest, Trigger};

pub fn trigger() -> Trigger {
    Trigger::new("new_scene_added", "story-42").at_chapter(7)
}

pub fn language_feed() -> Value {
    json!({
        "pacing": {"trend": "steady", "velocity": 0.4},
        "tone": {"label": "tense", "direction": "rising", "intensity": 0.7},
        "voice": {"consistency": 0.85, "notes": ["close third person"]},
        "tension_curve": [0.3, 0.4, 0.5, 0.6]
    })
}

pub fn graph_feed() -> Value {
    json!({
        "characters": [
            {"name": "Mara", "developing": true},
            {"name": "Tomas", "stagnant": true},
            "Iris"
        ],
        "relationships": [
            {"source": "Mara", "target": "Tomas", "type": "rivals", "recently_changed": true}
        ],
        "themes": [
            {"name": "inheritance", "manifestations": 4},
            {"name": "exile", "manifestations": 1, "underutilized": true}
        ],
        "unresolved_plot_threads": ["the missing ledger"],
        "story_metadata": {"title": "Salt Roads", "genre": "literary", "completion_percentage": 45.0}
    })
}

pub fn continuity_feed() -> Value {
    json!({
        "flags": [
            {"description": "Mara's eye colour changes between chapters 2 and 6", "severity": "minor", "scene_id": "ch6-s2"}
        ]
    })
}

pub fn preferences_feed() -> Value {
    json!({
        "acceptance_rate": 0.65,
        "style_notes": "prefers sparse dialogue tags",
        "total_suggestions_received": 12
    })
}

pub fn scenes(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Scene {} text. The tide came in.", i)).collect()
}

pub fn full_payloads() -> UpstreamPayloads {
    UpstreamPayloads {
        language: Some(language_feed()),
        graph: Some(graph_feed()),
        continuity: Some(continuity_feed()),
        preferences: Some(preferences_feed()),
        recent_scenes: scenes(3),
    }
}

pub fn request() -> CycleRequest {
    CycleRequest::new(trigger(), full_payloads())
}

pub fn config() -> PipelineConfig {
    PipelineConfig::default()
}

/// A judgment with one structural concern (the continuity slip) and one
/// thematic opportunity.
pub fn judgment_json() -> Value {
    json!({
        "momentum": {"status": "healthy", "rationale": "Each scene turns."},
        "character_arcs": {"overall_arc_health": "good", "characters_at_risk": ["Tomas"], "reasoning": "Tomas has not moved."},
        "emotional_trajectory": {"trend": "building", "current_state": "uneasy", "notes": ""},
        "structural_concerns": [
            {"concern": "Mara's eye colour is inconsistent", "severity": "moderate", "affected_scenes": ["ch6-s2"], "recommendation": "Settle on grey and fix chapter 6"}
        ],
        "thematic_health": {"themes_present": ["inheritance", "exile"], "reinforcement_quality": "moderate", "notes": ""},
        "opportunities": [
            {"type": "thematic_echo", "description": "Echo the exile motif in the harbour scene", "rationale": "Exile is underused", "estimated_impact": "medium", "confidence": 0.8}
        ],
        "open_questions": ["Is Tomas meant to stay static?"],
        "overall_story_health": "good",
        "health_reasoning": "Solid middle act.",
        "confidence": 0.82
    })
}

pub fn judgment_text() -> String {
    judgment_json().to_string()
}

/// Replays a fixed script of provider results and records when each call
/// arrived.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok(text: &str) -> Self {
        Self::new(vec![Ok(Completion::text(text))])
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ProviderError> {
        self.calls.lock().unwrap().push(Instant::now());
        let mut script = self.script.lock().unwrap();
        match script.len() {
            0 => Err(ProviderError::Transport("script exhausted".to_string())),
            // The last entry repeats forever.
            1 => script.front().cloned().unwrap(),
            _ => script.pop_front().unwrap(),
        }
    }
}

/// Never answers within any sane budget.
pub struct HangingProvider;

#[async_trait]
impl ReasoningProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ProviderError> {
        tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        Err(ProviderError::Timeout)
    }
}
