//! Backoff math for the reasoning client. Pure functions; the caller owns
//! the clock and the random source.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay before the retry that follows failed attempt `attempt` (0-based).
///
/// `min(max_delay, base_delay * 2^attempt) * (1 + (random * 2 - 1) * jitter)`
///
/// `random` is expected in `[0, 1)`; 0.5 yields the un-jittered value.
pub fn backoff_delay(attempt: u32, config: &RetryConfig, random: f64) -> Duration {
    let exponential = config.base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(config.max_delay_ms);

    let jitter = 1.0 + (random.clamp(0.0, 1.0) * 2.0 - 1.0) * config.jitter_factor;
    let millis = (capped as f64 * jitter).round().max(0.0) as u64;
    Duration::from_millis(millis)
}

/// Delay after a rate-limit response. A provider-advised delay is honored
/// as given (capped); without one the normal backoff applies.
pub fn rate_limit_delay(
    advised: Option<Duration>,
    attempt: u32,
    config: &RetryConfig,
    random: f64,
) -> Duration {
    match advised {
        Some(wait) => wait.min(Duration::from_millis(config.max_retry_after_ms)),
        None => backoff_delay(attempt, config, random),
    }
}

/// Parse a `Retry-After` header: delta seconds or an HTTP date.
/// Values too large for a `Duration` saturate; callers cap them anyway.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    if let Ok(seconds) = value.parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX));
        }
        return None;
    }

    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let millis = date.signed_duration_since(chrono::Utc::now()).num_milliseconds();
    Some(Duration::from_millis(millis.max(0) as u64))
}

pub(crate) fn jitter_sample() -> f64 {
    rand::thread_rng().gen::<f64>()
}
