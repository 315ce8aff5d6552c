use quill::config::PipelineConfig;
use quill::error::ConfigError;

#[test]
fn test_defaults_validate() {
    let config = PipelineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.planner.min_confidence, 0.6);
    assert_eq!(config.planner.max_suggestions, 5);
    assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let config = PipelineConfig::from_toml_str(
        r#"
        [planner]
        max_suggestions = 2

        [cycle]
        budget_ms = 10000
        "#,
    )
    .unwrap();

    assert_eq!(config.planner.max_suggestions, 2);
    assert_eq!(config.planner.min_confidence, 0.6);
    assert_eq!(config.cycle.budget_ms, 10_000);
    assert_eq!(config.retry.base_delay_ms, 1000);
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        ("[retry]\nmax_attempts = 0", "retry.max_attempts"),
        ("[planner]\nmin_confidence = 1.5", "planner.min_confidence"),
        ("[planner]\nmax_suggestions = 0", "planner.max_suggestions"),
        ("[planner]\nconcern_weight = -1.0", "planner.concern_weight"),
        ("[retry]\nbase_delay_ms = 5000\nmax_delay_ms = 100", "retry.max_delay_ms"),
        ("[cycle]\nbudget_ms = 0", "cycle.budget_ms"),
    ];

    for (raw, expected_key) in cases {
        match PipelineConfig::from_toml_str(raw) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected {} to be rejected, got {:?}", expected_key, other),
        }
    }
}

#[test]
fn test_unparseable_toml() {
    assert!(matches!(
        PipelineConfig::from_toml_str("[planner\nmax_suggestions = "),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file_is_read_error() {
    let err = PipelineConfig::load(Some(std::path::Path::new("/nonexistent/quill.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_api_key_is_never_serialized() {
    let mut config = PipelineConfig::default();
    config.llm.api_key = "sk-secret".to_string();

    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("sk-secret"));
}
