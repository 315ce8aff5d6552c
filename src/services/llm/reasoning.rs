use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::judgment::ReasoningJudgment;
use super::parse::{parse_judgment, ParseRoute};
use super::prompt::build_prompt;
use super::provider::{Completion, CompletionRequest, ErrorClass, ProviderError, ReasoningProvider};
use super::retry::{backoff_delay, jitter_sample, rate_limit_delay};
use crate::config::{LlmConfig, RetryConfig};
use crate::context::ContextSnapshot;
use crate::insight::Insights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Every attempt failed with a retryable error.
    ProviderExhausted,
    /// The provider refused in a way retrying cannot fix.
    ProviderFatal,
    /// A response arrived but no judgment could be read from it.
    Unparseable,
    /// The cycle ran out of wall-clock time.
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum JudgmentSource {
    Model,
    LenientParse,
    Fallback(FallbackReason),
}

/// One failed network attempt. Content-free.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptFailure {
    /// 1-based.
    pub attempt: u32,
    pub category: &'static str,
    /// Wait before the next attempt; None when no retry followed.
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub judgment: ReasoningJudgment,
    pub source: JudgmentSource,
    pub attempts: u32,
    pub failures: Vec<AttemptFailure>,
}

impl ReasoningOutcome {
    pub fn fallback(reason: FallbackReason, attempts: u32, failures: Vec<AttemptFailure>) -> Self {
        Self {
            judgment: ReasoningJudgment::fallback(),
            source: JudgmentSource::Fallback(reason),
            attempts,
            failures,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, JudgmentSource::Fallback(_))
    }
}

/// What to do after one attempt.
enum Attempt {
    Done(Completion),
    Retry(Duration),
    GiveUp(FallbackReason),
}

/// REASON step. Wraps a provider with bounded sequential retries and
/// response parsing. Never fails: every provider or parse problem ends in
/// a fallback judgment.
pub struct ReasoningClient {
    provider: Arc<dyn ReasoningProvider>,
    llm: LlmConfig,
    retry: RetryConfig,
}

impl ReasoningClient {
    pub fn new(provider: Arc<dyn ReasoningProvider>, llm: LlmConfig, retry: RetryConfig) -> Self {
        Self { provider, llm, retry }
    }

    pub async fn reason(&self, snapshot: &ContextSnapshot, insights: &Insights) -> ReasoningOutcome {
        let prompt = build_prompt(snapshot, insights, self.llm.max_prompt_tokens);
        if prompt.is_truncated() {
            debug!(
                dropped_scenes = prompt.dropped_scenes,
                scene_truncated = prompt.scene_truncated,
                dropped_sections = ?prompt.dropped_sections,
                "prompt trimmed to budget"
            );
        }

        let request = CompletionRequest {
            system: prompt.system,
            prompt: prompt.user,
            max_tokens: self.llm.max_output_tokens,
            temperature: self.llm.temperature,
        };

        let mut failures = Vec::new();
        let mut attempt = 0u32;
        let completion = loop {
            attempt += 1;
            match self.attempt(&request, attempt, &mut failures).await {
                Attempt::Done(c) => break c,
                Attempt::Retry(delay) => tokio::time::sleep(delay).await,
                Attempt::GiveUp(reason) => {
                    warn!(provider = self.provider.name(), attempts = attempt, ?reason, "reasoning fell back");
                    return ReasoningOutcome::fallback(reason, attempt, failures);
                }
            }
        };

        match parse_judgment(&completion.text) {
            Ok((mut judgment, route)) => {
                judgment.model = completion.model.or_else(|| Some(self.provider.name().to_string()));
                judgment.tokens_used = completion.tokens_used;
                let source = match route {
                    ParseRoute::Strict => JudgmentSource::Model,
                    ParseRoute::Lenient => JudgmentSource::LenientParse,
                };
                debug!(attempts = attempt, ?source, confidence = judgment.confidence, "judgment received");
                ReasoningOutcome { judgment, source, attempts: attempt, failures }
            }
            Err(e) => {
                warn!(attempts = attempt, category = e.category(), "model response unusable, falling back");
                ReasoningOutcome::fallback(FallbackReason::Unparseable, attempt, failures)
            }
        }
    }

    async fn attempt(&self, request: &CompletionRequest, attempt: u32, failures: &mut Vec<AttemptFailure>) -> Attempt {
        let error: ProviderError = match self.provider.complete(request).await {
            Ok(completion) => return Attempt::Done(completion),
            Err(e) => e,
        };

        let last = attempt >= self.retry.max_attempts;
        // Backoff exponent is 0 for the first retry.
        let retry_index = attempt - 1;
        let (delay, reason) = match error.class() {
            ErrorClass::Fatal => (None, Some(FallbackReason::ProviderFatal)),
            _ if last => (None, Some(FallbackReason::ProviderExhausted)),
            ErrorClass::Retryable => (Some(backoff_delay(retry_index, &self.retry, jitter_sample())), None),
            ErrorClass::RateLimited(advised) => (
                Some(rate_limit_delay(advised, retry_index, &self.retry, jitter_sample())),
                None,
            ),
        };

        warn!(attempt, category = error.category(), delay_ms = delay.map(|d| d.as_millis() as u64), "reasoning attempt failed");
        failures.push(AttemptFailure { attempt, category: error.category(), delay });

        match (delay, reason) {
            (_, Some(reason)) => Attempt::GiveUp(reason),
            (Some(delay), None) => Attempt::Retry(delay),
            (None, None) => Attempt::GiveUp(FallbackReason::ProviderExhausted),
        }
    }
}
