pub mod client;
pub mod judgment;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod reasoning;
pub mod retry;

pub use client::HttpProvider;
pub use judgment::*;
pub use provider::{Completion, CompletionRequest, ErrorClass, ProviderError, ReasoningProvider};
pub use reasoning::{AttemptFailure, FallbackReason, JudgmentSource, ReasoningClient, ReasoningOutcome};
