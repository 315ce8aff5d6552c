use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_API_KEY: &str = "QUILL_LLM_API_KEY";
pub const ENV_BASE_URL: &str = "QUILL_LLM_BASE_URL";
pub const ENV_MODEL: &str = "QUILL_LLM_MODEL";

/// Every tunable of the reasoning cycle. Loaded once at startup and shared
/// read-only by all cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub aggregator: AggregatorConfig,
    pub planner: PlannerConfig,
    pub cycle: CycleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Bearer token. Prefer the environment over the config file.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Upper bound on the estimated size of the user prompt.
    pub max_prompt_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: String::new(),
            request_timeout_ms: 20_000,
            max_output_tokens: 4000,
            temperature: 0.7,
            max_prompt_tokens: 32_000,
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total network attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Symmetric jitter, 0.2 means +/-20%.
    pub jitter_factor: f64,
    /// Cap applied to a provider-advised Retry-After.
    pub max_retry_after_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
            max_retry_after_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub max_recent_scenes: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { max_recent_scenes: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub min_confidence: f32,
    pub max_suggestions: usize,
    pub concern_weight: f32,
    pub opportunity_weight: f32,
    pub max_questions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            max_suggestions: 5,
            concern_weight: 1.0,
            opportunity_weight: 1.0,
            max_questions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Wall-clock budget for one full cycle.
    pub budget_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self { budget_ms: 45_000 }
    }
}

impl CycleConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}

impl PipelineConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.display().to_string(),
                    source,
                })?;
                toml::from_str(&raw)?
            }
            None => PipelineConfig::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            self.llm.model = model;
        }
    }

    /// Reject values that would turn the pipeline into a defect at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("llm.base_url", "must not be empty"));
        }
        if self.llm.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("llm.request_timeout_ms", "must be positive"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::invalid("llm.temperature", "must be within [0, 2]"));
        }
        if self.llm.max_prompt_tokens == 0 {
            return Err(ConfigError::invalid("llm.max_prompt_tokens", "must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(ConfigError::invalid("retry.jitter_factor", "must be within [0, 1]"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::invalid(
                "retry.max_delay_ms",
                "must not be smaller than retry.base_delay_ms",
            ));
        }
        if !(0.0..=1.0).contains(&self.planner.min_confidence) {
            return Err(ConfigError::invalid("planner.min_confidence", "must be within [0, 1]"));
        }
        if self.planner.max_suggestions == 0 {
            return Err(ConfigError::invalid("planner.max_suggestions", "must be at least 1"));
        }
        for (key, weight) in [
            ("planner.concern_weight", self.planner.concern_weight),
            ("planner.opportunity_weight", self.planner.opportunity_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(key, "must be a finite, non-negative number"));
            }
        }
        if self.cycle.budget_ms == 0 {
            return Err(ConfigError::invalid("cycle.budget_ms", "must be positive"));
        }
        Ok(())
    }
}
