mod common;

use common::*;
use quill::config::AggregatorConfig;
use quill::context::{
    ContextAggregator, ContextBuilder, PacingTrend, Severity, Signal, SourceStatus, UpstreamPayloads, Urgency,
};
use serde_json::json;

fn aggregator() -> ContextAggregator {
    ContextAggregator::new(AggregatorConfig::default())
}

#[test]
fn test_full_payloads_are_all_present() {
    let snapshot = aggregator().aggregate(&trigger(), &full_payloads());

    assert_eq!(snapshot.story_id, "story-42");
    assert_eq!(snapshot.trigger.event_name, "new_scene_added");
    assert_eq!(snapshot.sources.present_count(), 4);
    assert_eq!(snapshot.graph.characters.len(), 3);
    assert_eq!(snapshot.graph.themes.len(), 2);
    assert_eq!(snapshot.continuity.flags[0].severity, Severity::Minor);
    assert_eq!(snapshot.continuity.flags[0].scene_ref.as_deref(), Some("ch6-s2"));
    assert_eq!(snapshot.preferences.suggestions_received, 12);
    assert_eq!(snapshot.preferences.style_notes, vec!["prefers sparse dialogue tags".to_string()]);
    assert_eq!(snapshot.language.pacing.known().map(|p| p.trend), Some(PacingTrend::Steady));
    assert_eq!(snapshot.trigger.urgency, Urgency::Normal);
}

#[test]
fn test_progress_merges_trigger_and_metadata() {
    let snapshot = aggregator().aggregate(&trigger(), &full_payloads());

    assert_eq!(snapshot.progress.chapter, Signal::Known(7));
    assert_eq!(snapshot.progress.title, Signal::Known("Salt Roads".to_string()));
    let completion = *snapshot.progress.completion_ratio.known().unwrap();
    assert!((completion - 0.45).abs() < 1e-6);
    assert_eq!(snapshot.progress.paragraph, Signal::Unknown);
}

#[test]
fn test_every_presence_combination_builds() {
    let feeds = [language_feed(), graph_feed(), continuity_feed(), preferences_feed()];
    for mask in 0u8..16 {
        let pick = |i: usize| if mask & (1 << i) != 0 { Some(feeds[i].clone()) } else { None };
        let payloads = UpstreamPayloads {
            language: pick(0),
            graph: pick(1),
            continuity: pick(2),
            preferences: pick(3),
            recent_scenes: scenes((mask % 4) as usize),
        };
        let snapshot = aggregator().aggregate(&trigger(), &payloads);
        assert_eq!(snapshot.sources.present_count(), mask.count_ones() as usize);
        assert!((0.0..=1.0).contains(&snapshot.completeness));
    }
}

#[test]
fn test_fully_absent_snapshot() {
    let snapshot = aggregator().aggregate(&trigger(), &UpstreamPayloads::default());

    assert_eq!(snapshot.sources.language, SourceStatus::Absent);
    assert_eq!(snapshot.language.pacing, Signal::Unknown);
    assert!(snapshot.graph.characters.is_empty());
    assert!(snapshot.continuity.flags.is_empty());
    assert_eq!(snapshot.preferences.acceptance_rate, Signal::Unknown);
    assert_eq!(snapshot.completeness, 0.0);
}

#[test]
fn test_malformed_feed_is_recorded_not_raised() {
    let payloads = UpstreamPayloads {
        language: Some(json!("not an object")),
        graph: Some(json!({"characters": 12})),
        continuity: Some(json!(null)),
        preferences: Some(json!({"acceptance_rate": "high"})),
        recent_scenes: vec![],
    };
    let snapshot = aggregator().aggregate(&trigger(), &payloads);

    assert_eq!(snapshot.sources.language, SourceStatus::Malformed);
    assert_eq!(snapshot.sources.graph, SourceStatus::Malformed);
    assert_eq!(snapshot.sources.continuity, SourceStatus::Absent);
    assert_eq!(snapshot.sources.preferences, SourceStatus::Malformed);
    assert_eq!(snapshot.sources.present_count(), 0);
}

#[test]
fn test_recent_scenes_keep_most_recent_window() {
    let snapshot = ContextBuilder::new(trigger())
        .max_recent_scenes(2)
        .recent_scenes(vec!["one".into(), "  ".into(), "two".into(), "three".into()])
        .build();

    assert_eq!(snapshot.recent_scenes, vec!["two".to_string(), "three".to_string()]);
}

#[test]
fn test_out_of_range_numbers_are_clamped() {
    let snapshot = ContextBuilder::new(trigger())
        .preferences(Some(&json!({"acceptance_rate": 1.7})))
        .language(Some(&json!({"tension_curve": [-0.5, 0.5, 2.0]})))
        .build();

    assert_eq!(snapshot.preferences.acceptance_rate, Signal::Known(1.0));
    assert_eq!(snapshot.language.tension_curve, vec![0.0, 0.5, 1.0]);
}

#[test]
fn test_urgency_rules() {
    let critical = ContextBuilder::new(trigger())
        .continuity(Some(&json!({"flags": [{"description": "dead man walks", "severity": "critical"}]})))
        .build();
    assert_eq!(critical.trigger.urgency, Urgency::Critical);

    let stalling = ContextBuilder::new(trigger())
        .language(Some(&json!({"pacing": "stalling"})))
        .build();
    assert_eq!(stalling.trigger.urgency, Urgency::High);

    let majors = ContextBuilder::new(trigger())
        .continuity(Some(&json!({"flags": [
            {"description": "a", "severity": "major"},
            {"description": "b", "severity": "major"},
            {"description": "c", "severity": "major"},
            {"description": "d", "severity": "major"}
        ]})))
        .build();
    assert_eq!(majors.trigger.urgency, Urgency::High);
}

#[test]
fn test_completeness_counts_criteria() {
    let snapshot = aggregator().aggregate(&trigger(), &full_payloads());
    // scenes >= 3, characters, language, > 5 suggestions, completion > 10%
    assert!((snapshot.completeness - 1.0).abs() < 1e-6);
}
