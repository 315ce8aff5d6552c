use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// One chat-style completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), model: None, tokens_used: None }
    }
}

/// Failures at the model endpoint. Messages carry status and category only,
/// never prompt or story content.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// How the reasoning client should react to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    /// Wait for the advised delay when given, else back off normally.
    RateLimited(Option<Duration>),
    /// Retrying cannot help (bad credentials, malformed request).
    Fatal,
}

impl ProviderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::Timeout | ProviderError::Connect(_) | ProviderError::Transport(_) => {
                ErrorClass::Retryable
            }
            ProviderError::RateLimited { retry_after } => ErrorClass::RateLimited(*retry_after),
            ProviderError::Status { status, .. } => {
                if *status == 408 || *status >= 500 {
                    ErrorClass::Retryable
                } else {
                    ErrorClass::Fatal
                }
            }
            ProviderError::Decode(_) => ErrorClass::Fatal,
        }
    }

    /// Short content-free label for logs and telemetry.
    pub fn category(&self) -> &'static str {
        match self {
            ProviderError::Timeout => "timeout",
            ProviderError::Connect(_) => "connect",
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::Status { status, .. } if *status >= 500 => "server_error",
            ProviderError::Status { .. } => "client_error",
            ProviderError::Decode(_) => "decode",
            ProviderError::Transport(_) => "transport",
        }
    }
}

/// A model endpoint. The HTTP implementation lives in `client`; tests
/// substitute scripted stubs.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;
}
