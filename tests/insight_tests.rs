mod common;

use common::*;
use quill::context::{ContextAggregator, ContextBuilder, UpstreamPayloads};
use quill::insight::*;
use serde_json::json;

#[test]
fn test_fully_absent_snapshot_reads_neutral() {
    let snapshot = ContextAggregator::default().aggregate(&trigger(), &UpstreamPayloads::default());
    let insights = InsightExtractor::new().extract(&snapshot);

    assert_eq!(insights, Insights::neutral());
}

#[test]
fn test_extraction_is_deterministic() {
    let snapshot = ContextAggregator::default().aggregate(&trigger(), &full_payloads());
    let extractor = InsightExtractor::new();

    assert_eq!(extractor.extract(&snapshot), extractor.extract(&snapshot));
}

#[test]
fn test_full_snapshot_reads() {
    let snapshot = ContextAggregator::default().aggregate(&trigger(), &full_payloads());
    let insights = InsightExtractor::new().extract(&snapshot);

    assert_eq!(insights.pacing, PacingInsight::Steady);
    assert_eq!(insights.stage, NarrativeStage::RisingAction);
    // 1 of 3 characters stagnant
    assert_eq!(insights.character_health, CharacterHealth::NeedsAttention);
    assert_eq!(insights.continuity_status, ContinuityStatus::MinorIssues);
    assert_eq!(insights.writer_engagement, WriterEngagement::ModeratelyEngaged);
    assert_eq!(insights.context_quality, ContextQuality::Excellent);
    assert!(insights.focus_areas.contains(&FocusArea::CharacterDevelopment));
    assert!(insights.key_insights.iter().any(|s| s.contains("1 characters")));
}

#[test]
fn test_pacing_from_tension_curve() {
    let extractor = InsightExtractor::new();
    let read = |curve: serde_json::Value| {
        let snapshot = ContextBuilder::new(trigger())
            .language(Some(&json!({ "tension_curve": curve })))
            .build();
        extractor.extract(&snapshot).pacing
    };

    assert_eq!(read(json!([0.2, 0.4, 0.6, 0.8])), PacingInsight::Accelerating);
    assert_eq!(read(json!([0.9, 0.6, 0.3])), PacingInsight::Decelerating);
    assert_eq!(read(json!([0.1, 0.12, 0.1])), PacingInsight::Stalling);
    assert_eq!(read(json!([0.6, 0.62, 0.6])), PacingInsight::Steady);
    assert_eq!(read(json!([0.6, 0.9])), PacingInsight::Unknown);
}

#[test]
fn test_upstream_pacing_label_wins() {
    let snapshot = ContextBuilder::new(trigger())
        .language(Some(&json!({"pacing": "stalling", "tension_curve": [0.1, 0.5, 0.9]})))
        .build();
    let insights = InsightExtractor::new().extract(&snapshot);

    assert_eq!(insights.pacing, PacingInsight::Stalling);
    assert!(insights.focus_areas.contains(&FocusArea::Pacing));
}

#[test]
fn test_scores_stay_in_unit_range() {
    let snapshot = ContextBuilder::new(trigger())
        .graph(Some(&json!({
            "characters": [{"name": "A", "stagnant": true}],
            "themes": [],
            "story_metadata": {"completion_ratio": 3.0}
        })))
        .build();
    let insights = InsightExtractor::new().extract(&snapshot);

    assert!((0.0..=1.0).contains(&insights.arc_completion));
    assert_eq!(insights.thematic_consistency, 0.0);
    assert_eq!(insights.stage, NarrativeStage::FinalPolish);
    assert_eq!(insights.character_health, CharacterHealth::Concerning);
}

#[test]
fn test_stage_thresholds() {
    assert_eq!(NarrativeStage::from_completion(0.0), NarrativeStage::EarlySetup);
    assert_eq!(NarrativeStage::from_completion(0.2), NarrativeStage::WorldEstablishment);
    assert_eq!(NarrativeStage::from_completion(0.79), NarrativeStage::ClimaxApproach);
    assert_eq!(NarrativeStage::from_completion(0.9), NarrativeStage::ClimaxAndResolution);
    assert_eq!(NarrativeStage::from_completion(0.97), NarrativeStage::FinalPolish);
}
