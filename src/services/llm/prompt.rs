use serde::Serialize;

use crate::context::ContextSnapshot;
use crate::insight::Insights;

pub const SYSTEM_PREAMBLE: &str = "You are a senior fiction editor reading a manuscript in progress. \
You judge momentum, character arcs, emotional trajectory, structure and theme the way an \
experienced writer would, and you only suggest what would genuinely strengthen the story. \
You answer with a single JSON object and nothing else.";

pub const RESPONSE_FORMAT: &str = r#"Respond with exactly one JSON object of this shape:
{
  "momentum": {"status": "healthy|stalling|rushing|unstable", "rationale": "..."},
  "character_arcs": {"overall_arc_health": "excellent|good|needs_work|problematic", "characters_at_risk": ["..."], "reasoning": "..."},
  "emotional_trajectory": {"trend": "building|plateauing|dissipating|volatile", "current_state": "...", "notes": "..."},
  "structural_concerns": [{"concern": "...", "severity": "critical|major|moderate|minor", "affected_scenes": ["..."], "recommendation": "..."}],
  "thematic_health": {"themes_present": ["..."], "reinforcement_quality": "strong|moderate|weak|absent", "notes": "..."},
  "opportunities": [{"type": "scene_addition|character_moment|thematic_echo|dialogue_refinement|relationship_development|pacing_adjustment", "description": "...", "rationale": "...", "estimated_impact": "high|medium|low", "confidence": 0.0, "related_scenes": ["..."]}],
  "open_questions": ["..."],
  "overall_story_health": "excellent|good|needs_attention|critical",
  "health_reasoning": "...",
  "confidence": 0.0
}"#;

// Tails shorter than this are not worth sending.
const MIN_SCENE_TAIL_TOKENS: usize = 32;

/// Rough token count used for budgeting: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Signal sections in the order they are given up when over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptSection {
    WriterPreferences,
    LanguageSignals,
    KnowledgeGraph,
    DerivedInsights,
    ContinuityFlags,
}

impl PromptSection {
    const PRESENTATION_ORDER: [PromptSection; 5] = [
        PromptSection::DerivedInsights,
        PromptSection::ContinuityFlags,
        PromptSection::KnowledgeGraph,
        PromptSection::LanguageSignals,
        PromptSection::WriterPreferences,
    ];

    fn heading(self) -> &'static str {
        match self {
            PromptSection::WriterPreferences => "Writer preferences",
            PromptSection::LanguageSignals => "Language signals",
            PromptSection::KnowledgeGraph => "Knowledge graph",
            PromptSection::DerivedInsights => "Derived insights",
            PromptSection::ContinuityFlags => "Continuity flags",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub estimated_tokens: usize,
    pub dropped_scenes: usize,
    pub scene_truncated: bool,
    pub dropped_sections: Vec<PromptSection>,
}

impl Prompt {
    pub fn is_truncated(&self) -> bool {
        self.dropped_scenes > 0 || self.scene_truncated || !self.dropped_sections.is_empty()
    }
}

/// Serialize snapshot and insights into a prompt of at most `max_tokens`
/// estimated tokens. The preamble, the trigger and the response format are
/// always kept, even when they alone exceed the budget.
pub fn build_prompt(snapshot: &ContextSnapshot, insights: &Insights, max_tokens: usize) -> Prompt {
    let trigger = trigger_section(snapshot);
    let fixed = estimate_tokens(SYSTEM_PREAMBLE) + estimate_tokens(&trigger) + estimate_tokens(RESPONSE_FORMAT);

    let mut sections: Vec<(PromptSection, String)> = PromptSection::PRESENTATION_ORDER
        .iter()
        .map(|&s| (s, render_section(s, snapshot, insights)))
        .collect();
    let mut scenes: Vec<String> = snapshot.recent_scenes.clone();

    let total = |sections: &[(PromptSection, String)], scenes: &[String]| {
        fixed
            + sections.iter().map(|(_, t)| estimate_tokens(t)).sum::<usize>()
            + scenes.iter().map(|s| estimate_tokens(s)).sum::<usize>()
    };

    let mut dropped_scenes = 0;
    let mut scene_truncated = false;
    let mut dropped_sections = Vec::new();

    while total(&sections, &scenes) > max_tokens && scenes.len() > 1 {
        scenes.remove(0);
        dropped_scenes += 1;
    }

    let current = total(&sections, &scenes);
    if current > max_tokens && scenes.len() == 1 {
        let scene_tokens = estimate_tokens(&scenes[0]);
        let room = max_tokens.saturating_sub(current - scene_tokens);
        if room >= MIN_SCENE_TAIL_TOKENS {
            scenes[0] = tail_chars(&scenes[0], room * 4);
            scene_truncated = true;
        } else {
            scenes.clear();
            dropped_scenes += 1;
        }
    }

    while total(&sections, &scenes) > max_tokens && !sections.is_empty() {
        let least = sections
            .iter()
            .enumerate()
            .min_by_key(|(_, (s, _))| *s)
            .map(|(i, _)| i);
        if let Some(i) = least {
            let (section, _) = sections.remove(i);
            dropped_sections.push(section);
        }
    }

    let estimated_tokens = total(&sections, &scenes);
    let mut user = String::new();
    user.push_str(&trigger);
    for (section, body) in &sections {
        user.push_str(&format!("\n## {}\n{}\n", section.heading(), body));
    }
    if !scenes.is_empty() {
        user.push_str("\n## Recent scenes (oldest first)\n");
        for (i, scene) in scenes.iter().enumerate() {
            user.push_str(&format!("\n### Scene {}\n{}\n", i + 1, scene));
        }
    }
    user.push('\n');
    user.push_str(RESPONSE_FORMAT);

    Prompt {
        system: SYSTEM_PREAMBLE.to_string(),
        user,
        estimated_tokens,
        dropped_scenes,
        scene_truncated,
        dropped_sections,
    }
}

fn trigger_section(snapshot: &ContextSnapshot) -> String {
    let mut out = format!(
        "## Trigger\nEvent `{}` for story `{}` at {} (urgency: {:?}).\n",
        snapshot.trigger.event_name,
        snapshot.story_id,
        snapshot.trigger.timestamp.to_rfc3339(),
        snapshot.trigger.urgency,
    );
    let p = &snapshot.progress;
    if let Some(title) = p.title.known() {
        out.push_str(&format!("Title: {}\n", title));
    }
    if let Some(genre) = p.genre.known() {
        out.push_str(&format!("Genre: {}\n", genre));
    }
    if let Some(chapter) = p.chapter.known() {
        out.push_str(&format!("Chapter: {}\n", chapter));
    }
    if let Some(scene) = p.scene_id.known() {
        out.push_str(&format!("Scene: {}\n", scene));
    }
    if let Some(ratio) = p.completion_ratio.known() {
        out.push_str(&format!("Completion: {:.0}%\n", ratio * 100.0));
    }
    out
}

fn render_section(section: PromptSection, snapshot: &ContextSnapshot, insights: &Insights) -> String {
    match section {
        PromptSection::WriterPreferences => serde_json::to_string_pretty(&snapshot.preferences).unwrap_or_default(),
        PromptSection::LanguageSignals => serde_json::to_string_pretty(&snapshot.language).unwrap_or_default(),
        PromptSection::KnowledgeGraph => serde_json::to_string_pretty(&snapshot.graph).unwrap_or_default(),
        PromptSection::DerivedInsights => serde_json::to_string_pretty(insights).unwrap_or_default(),
        PromptSection::ContinuityFlags => serde_json::to_string_pretty(&snapshot.continuity).unwrap_or_default(),
    }
}

fn tail_chars(text: &str, keep: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(keep)).collect()
}
