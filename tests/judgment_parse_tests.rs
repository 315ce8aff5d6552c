mod common;

use common::*;
use quill::context::Severity;
use quill::error::ParseError;
use quill::services::llm::parse::{json_object_spans, parse_judgment, ParseRoute};
use quill::services::llm::{Impact, MomentumStatus, ReasoningJudgment, StoryHealth};

#[test]
fn test_strict_parse() {
    let (judgment, route) = parse_judgment(&judgment_text()).unwrap();

    assert_eq!(route, ParseRoute::Strict);
    assert_eq!(judgment.momentum.status, MomentumStatus::Healthy);
    assert_eq!(judgment.structural_concerns[0].severity, Severity::Moderate);
    assert_eq!(judgment.opportunities[0].kind, "thematic_echo");
    assert_eq!(judgment.opportunities[0].estimated_impact, Impact::Medium);
    assert_eq!(judgment.overall_story_health, StoryHealth::Good);
    assert!((judgment.confidence - 0.82).abs() < 1e-6);
}

#[test]
fn test_fenced_json_is_lenient() {
    let text = format!("Here is my assessment:\n```json\n{}\n```\nHope it helps.", judgment_text());
    let (judgment, route) = parse_judgment(&text).unwrap();

    assert_eq!(route, ParseRoute::Lenient);
    assert_eq!(judgment.open_questions.len(), 1);
}

#[test]
fn test_largest_object_in_prose() {
    let text = format!(
        "Note {{\"aside\": true}} then the real answer: {} and a closing {{brace",
        judgment_text()
    );
    let (judgment, route) = parse_judgment(&text).unwrap();

    assert_eq!(route, ParseRoute::Lenient);
    assert_eq!(judgment.overall_story_health, StoryHealth::Good);
}

#[test]
fn test_braces_inside_strings_do_not_confuse_scanner() {
    let text = r#"prefix {"a": "has } and { inside", "b": {"c": 1}} suffix"#;
    let spans = json_object_spans(text);

    assert_eq!(spans, vec![r#"{"a": "has } and { inside", "b": {"c": 1}}"#, r#"{"c": 1}"#]);
}

#[test]
fn test_judgment_inside_broken_wrapper() {
    let text = format!("Here you go: {{\"analysis\": {}, \"note\": 'done'}}", judgment_text());
    let (judgment, route) = parse_judgment(&text).unwrap();

    assert_eq!(route, ParseRoute::Lenient);
    assert_eq!(judgment.overall_story_health, StoryHealth::Good);
    assert!((judgment.confidence - 0.82).abs() < 1e-6);
}

#[test]
fn test_unclosed_opener_is_skipped() {
    let spans = json_object_spans(r#"{ broken {"ok": 1}"#);
    assert_eq!(spans, vec![r#"{"ok": 1}"#]);
}

#[test]
fn test_truncated_json_fails() {
    let text = judgment_text();
    let cut = &text[..text.len() / 2];
    assert!(parse_judgment(cut).is_err());
}

#[test]
fn test_no_json_at_all() {
    match parse_judgment("I cannot help with that.") {
        Err(ParseError::NoJson) => {}
        other => panic!("expected NoJson, got {:?}", other.map(|(_, r)| r)),
    }
}

#[test]
fn test_missing_confidence_is_schema_failure() {
    let mut value = judgment_json();
    value.as_object_mut().unwrap().remove("confidence");
    assert!(parse_judgment(&value.to_string()).is_err());
}

#[test]
fn test_out_of_range_confidence_rejected() {
    let mut value = judgment_json();
    value["confidence"] = serde_json::json!(1.5);
    match parse_judgment(&value.to_string()) {
        Err(ParseError::Schema(_)) => {}
        other => panic!("expected schema error, got {:?}", other.map(|(_, r)| r)),
    }
}

#[test]
fn test_unknown_labels_and_aliases() {
    let text = r#"{
        "momentum_assessment": {"status": "glacial", "evidence": "nothing happens"},
        "structural_concerns": [{"description": "Sagging middle", "severity": "HIGH"}],
        "opportunities": [{"type": "callback", "specific_suggestion": "Bring back the lantern", "expected_impact": "Significant lift to the ending"}],
        "questions_for_writer": ["Why the lantern?"],
        "overall_story_health": "wobbly",
        "reasoning_confidence": 0.7
    }"#;
    let (judgment, _) = parse_judgment(text).unwrap();

    assert_eq!(judgment.momentum.status, MomentumStatus::Unknown);
    assert_eq!(judgment.momentum.rationale, "nothing happens");
    assert_eq!(judgment.structural_concerns[0].severity, Severity::Major);
    assert_eq!(judgment.opportunities[0].description, "Bring back the lantern");
    assert_eq!(judgment.opportunities[0].estimated_impact, Impact::High);
    assert_eq!(judgment.open_questions, vec!["Why the lantern?".to_string()]);
    assert_eq!(judgment.overall_story_health, StoryHealth::Unknown);
}

#[test]
fn test_fallback_shape() {
    let fallback = ReasoningJudgment::fallback();

    assert_eq!(fallback.confidence, 0.0);
    assert_eq!(fallback.overall_story_health, StoryHealth::Unknown);
    assert!(fallback.structural_concerns.is_empty());
    assert!(fallback.opportunities.is_empty());
    assert!(fallback.is_fallback());
}
