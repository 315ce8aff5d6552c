use thiserror::Error;

use crate::kernel::state::{CycleState, CycleStep};

/// Configuration could not be loaded or describes an impossible pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { key, reason: reason.into() }
    }
}

/// Model output that could not be turned into a judgment.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("model output is not valid judgment JSON: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("judgment failed validation: {0}")]
    Schema(String),
}

impl ParseError {
    pub fn category(&self) -> &'static str {
        match self {
            ParseError::NoJson => "no_json",
            ParseError::Invalid(_) => "invalid_json",
            ParseError::Schema(_) => "schema",
        }
    }
}

/// Defects inside the planner. These indicate broken configuration or code,
/// never bad model output.
#[derive(Debug, Error, PartialEq)]
pub enum PlanningError {
    #[error("priority score for candidate {index} is not finite ({score})")]
    NonFiniteScore { index: usize, score: f32 },

    #[error("max_suggestions must be at least 1")]
    ZeroCapacity,
}

/// The only errors a cycle can surface to its caller.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("planning defect: {0}")]
    Planning(#[from] PlanningError),

    #[error("illegal cycle transition: {step:?} while {from:?}")]
    IllegalTransition { from: CycleState, step: CycleStep },
}
