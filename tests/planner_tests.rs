mod common;

use common::*;
use quill::config::PlannerConfig;
use quill::context::{ContextAggregator, ContextSnapshot, Severity};
use quill::error::PlanningError;
use quill::planner::*;
use quill::services::llm::{Impact, Opportunity, ReasoningJudgment, StoryHealth, StructuralConcern};
use uuid::Uuid;

fn snapshot() -> ContextSnapshot {
    ContextAggregator::default().aggregate(&trigger(), &full_payloads())
}

fn judgment() -> ReasoningJudgment {
    serde_json::from_value(judgment_json()).unwrap()
}

fn opportunity(description: &str, impact: Impact, confidence: f32) -> Opportunity {
    Opportunity {
        kind: "character_moment".to_string(),
        description: description.to_string(),
        rationale: format!("because {}", description),
        estimated_impact: impact,
        confidence: Some(confidence),
        related_scenes: vec![],
    }
}

fn concern(text: &str, severity: Severity) -> StructuralConcern {
    StructuralConcern {
        concern: text.to_string(),
        severity,
        affected_scenes: vec![],
        recommendation: None,
    }
}

fn planner(max_suggestions: usize) -> InterventionPlanner {
    InterventionPlanner::new(PlannerConfig { max_suggestions, ..PlannerConfig::default() })
}

#[test]
fn test_new_scene_scenario_yields_two_interventions() {
    let snap = snapshot();
    let plan = planner(5).plan(Uuid::new_v4(), &judgment(), &snap).unwrap();

    assert_eq!(plan.status, PlanStatus::Planned);
    assert_eq!(plan.interventions.len(), 2);
    assert_eq!(plan.overall_story_health, StoryHealth::Good);
    assert_eq!(plan.story_id, "story-42");
    assert_eq!(plan.trigger_event, "new_scene_added");

    let first = &plan.interventions[0];
    assert_eq!(first.origin, CandidateOrigin::StructuralConcern);
    assert_eq!(first.priority, 1);
    assert_eq!(first.what, "Settle on grey and fix chapter 6");
    assert_eq!(first.target, Some(TargetHint { chapter: Some(7), scene: Some("ch6-s2".into()) }));

    let second = &plan.interventions[1];
    assert_eq!(second.origin, CandidateOrigin::Opportunity);
    assert_eq!(second.kind, InterventionKind::ThematicReinforcement);
    assert!((second.confidence - 0.8).abs() < 1e-6);
    assert_eq!(plan.questions_for_writer, vec!["Is Tomas meant to stay static?".to_string()]);
}

#[test]
fn test_cap_keeps_highest_scores_in_order() {
    let mut j = judgment();
    j.structural_concerns.clear();
    j.opportunities = vec![
        opportunity("low", Impact::Low, 0.9),
        opportunity("high", Impact::High, 0.9),
        opportunity("medium", Impact::Medium, 0.9),
    ];

    let plan = planner(2).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert_eq!(plan.interventions.len(), 2);
    assert_eq!(plan.interventions[0].what, "high");
    assert_eq!(plan.interventions[1].what, "medium");
    assert!(plan.interventions[0].score >= plan.interventions[1].score);
    assert_eq!(plan.interventions[0].level, PriorityLevel::High);
    assert!(plan.exclusion_note.as_deref().unwrap().contains("1 deferred"));
}

#[test]
fn test_ties_keep_concerns_before_opportunities() {
    let mut j = judgment();
    j.structural_concerns = vec![concern("pacing sags", Severity::Moderate)];
    j.opportunities = vec![opportunity("add a beat", Impact::Medium, 0.9)];

    let plan = planner(5).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert_eq!(plan.interventions[0].score, plan.interventions[1].score);
    assert_eq!(plan.interventions[0].origin, CandidateOrigin::StructuralConcern);
    assert_eq!(plan.interventions[0].what, "Address: pacing sags");
}

#[test]
fn test_all_below_threshold_is_low_confidence_not_unavailable() {
    let mut j = judgment();
    j.confidence = 0.4;

    let plan = planner(5).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert!(plan.interventions.is_empty());
    assert_eq!(plan.status, PlanStatus::LowConfidence);
    assert!((plan.confidence - 0.4).abs() < 1e-6);
    assert!(plan.rationale.to_lowercase().contains("low confidence"));
}

#[test]
fn test_opportunity_confidence_never_exceeds_judgment() {
    let mut j = judgment();
    j.structural_concerns.clear();
    j.opportunities = vec![opportunity("overconfident", Impact::High, 0.99)];
    j.confidence = 0.7;

    let plan = planner(5).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert!((plan.interventions[0].confidence - 0.7).abs() < 1e-6);
}

#[test]
fn test_fallback_judgment_is_reasoning_unavailable() {
    let plan = planner(5)
        .plan(Uuid::new_v4(), &ReasoningJudgment::fallback(), &snapshot())
        .unwrap();

    assert_eq!(plan.confidence, 0.0);
    assert!(plan.interventions.is_empty());
    assert_eq!(plan.status, PlanStatus::ReasoningUnavailable);
    assert_eq!(plan.overall_story_health, StoryHealth::Unknown);
    assert!(plan.rationale.contains("unavailable"));
}

#[test]
fn test_healthy_story_has_positive_rationale() {
    let mut j = judgment();
    j.structural_concerns.clear();
    j.opportunities.clear();
    j.overall_story_health = StoryHealth::Excellent;

    let plan = planner(5).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert!(plan.interventions.is_empty());
    assert_eq!(plan.status, PlanStatus::Healthy);
    assert!(plan.confidence > 0.0);
    assert!(plan.rationale.contains("excellent"));
}

#[test]
fn test_questions_are_capped() {
    let mut j = judgment();
    j.open_questions = (1..=6).map(|i| format!("Question {}?", i)).collect();

    let plan = planner(5).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert_eq!(plan.questions_for_writer.len(), 3);
}

#[test]
fn test_non_finite_weight_is_a_defect() {
    let config = PlannerConfig { concern_weight: f32::INFINITY * 0.0, ..PlannerConfig::default() };
    let planner = InterventionPlanner::new(config);

    let err = planner.plan(Uuid::new_v4(), &judgment(), &snapshot()).unwrap_err();
    assert!(matches!(err, PlanningError::NonFiniteScore { index: 0, .. }));
}

#[test]
fn test_zero_capacity_is_a_defect() {
    let err = planner(0).plan(Uuid::new_v4(), &judgment(), &snapshot()).unwrap_err();
    assert_eq!(err, PlanningError::ZeroCapacity);
}

#[test]
fn test_plan_round_trips_through_json() {
    let plan = planner(5).plan(Uuid::new_v4(), &judgment(), &snapshot()).unwrap();

    let encoded = serde_json::to_string(&plan).unwrap();
    let decoded: InterventionPlan = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded, plan);
}

#[test]
fn test_by_level_and_explain() {
    let mut j = judgment();
    j.structural_concerns = vec![concern("timeline break", Severity::Critical)];

    let plan = planner(5).plan(Uuid::new_v4(), &j, &snapshot()).unwrap();

    assert_eq!(plan.by_level(PriorityLevel::Critical).count(), 1);
    assert_eq!(plan.by_level(PriorityLevel::Medium).count(), 1);
    let breakdown = plan.breakdown();
    assert_eq!((breakdown.critical, breakdown.medium), (1, 1));
    assert!(plan.explain().starts_with("2 intervention(s) planned (1 critical, 1 medium priority)."));
}

#[test]
fn test_opportunity_type_mapping() {
    assert_eq!(InterventionKind::from_opportunity_type("Scene Addition"), InterventionKind::SceneAddition);
    assert_eq!(InterventionKind::from_opportunity_type("dialogue_refinement"), InterventionKind::DialogueAdjustment);
    assert_eq!(InterventionKind::from_opportunity_type("something-new"), InterventionKind::StructuralAdjustment);
}
