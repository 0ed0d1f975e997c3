//! Retry with exponential backoff for rate-limited model calls
//!
//! Only failures classified as rate limits are retried. Everything else is
//! returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;

use crate::core::AgentError;

/// Backoff configuration for rate-limited calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Base unit multiplied by 2^(attempt-1).
    pub multiplier: Duration,
    /// Lower bound for a single delay.
    pub min_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Random extra delay range, `None` disables jitter.
    pub jitter: Option<(Duration, Duration)>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(60),
            jitter: Some((Duration::from_millis(100), Duration::from_secs(1))),
        }
    }
}

impl RetryPolicy {
    /// Disable random jitter (deterministic delays)
    pub fn without_jitter(mut self) -> Self {
        self.jitter = None;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 2f64.powi(attempt.saturating_sub(1).min(30) as i32);
        let secs = self.multiplier.as_secs_f64() * exp;
        let clamped = secs
            .max(self.min_delay.as_secs_f64())
            .min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(clamped)
    }

    fn jitter(&self) -> Duration {
        match self.jitter {
            Some((lo, hi)) if hi > lo => rand::thread_rng().gen_range(lo..=hi),
            Some((lo, _)) => lo,
            None => Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails with a non-rate-limit error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    pub async fn retry<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("[Retry] Succeeded on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(e) if is_rate_limit(&e) => {
                    if attempt >= self.max_attempts {
                        tracing::error!("[Retry] Rate limited, giving up after {} attempts", attempt);
                        let last = format!("{:#}", e);
                        return Err(e.context(AgentError::RetriesExhausted {
                            attempts: attempt,
                            last,
                        }));
                    }

                    let delay = self.delay_for(attempt) + self.jitter();
                    tracing::warn!(
                        "[Retry] Rate limit hit on attempt {}. Retrying in {:?}: {}",
                        attempt,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Whether an error represents a rate-limit response from the model API.
pub fn is_rate_limit(err: &anyhow::Error) -> bool {
    if let Some(AgentError::Api { status: 429, .. }) = err.downcast_ref::<AgentError>() {
        return true;
    }
    is_rate_limit_text(&format!("{:#}", err))
}

/// Substring classification used for errors that arrive as plain text.
pub fn is_rate_limit_text(text: &str) -> bool {
    text.contains("rate_limit_error")
        || text.contains("status_code: 429")
        || text.contains("status 429")
}
