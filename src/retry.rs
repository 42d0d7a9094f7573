//! # Retry
//!
//! A single `RetryPolicy` wraps every external call the pipeline makes:
//! catalog and detail page fetches, embedding requests and index upserts.
//!
//! Attempt `n` (1-based) that fails waits `base_delay * 2^n` before the next
//! try, multiplied by `rate_limit_factor` when the error reports rate
//! limiting (see [`RetryError`]). Jitter of up to a quarter of the delay is
//! added on top.

use crate::config::RetryConfig;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Fraction of the computed backoff added as random jitter
const JITTER_RATIO: f64 = 0.25;

/// Errors a [`RetryPolicy`] can retry
pub trait RetryError: Display {
    /// True when the failure was the remote side throttling us.
    fn is_rate_limited(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff unit; the wait after attempt `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
    /// Multiplier applied to the backoff for rate-limited failures.
    pub rate_limit_factor: u32,
    /// Whether random jitter is added to each backoff.
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay),
            rate_limit_factor: config.rate_limit_factor.max(1),
            jitter: config.jitter,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Deterministic part of the wait after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, rate_limited: bool) -> Duration {
        let exponential = self.base_delay * 2u32.saturating_pow(attempt);
        if rate_limited {
            exponential * self.rate_limit_factor
        } else {
            exponential
        }
    }

    fn sleep_for(&self, attempt: u32, rate_limited: bool) -> Duration {
        let delay = self.backoff(attempt, rate_limited);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(0.0..=JITTER_RATIO);
        delay + delay.mul_f64(extra)
    }

    /// Runs `op` until it succeeds or attempts are exhausted, retrying every error.
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryError,
    {
        self.run_if(label, |_| true, op).await
    }

    /// Runs `op` with retries, giving up early on errors `retryable` rejects.
    ///
    /// The final error is returned unchanged to the caller.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        label: &str,
        retryable: P,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryError,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !retryable(&err) {
                        tracing::warn!("{} failed with non-retryable error: {}", label, err);
                        return Err(err);
                    }
                    if attempt >= self.max_attempts {
                        tracing::error!(
                            "{} failed after {} attempts: {}",
                            label,
                            self.max_attempts,
                            err
                        );
                        return Err(err);
                    }

                    let rate_limited = err.is_rate_limited();
                    let wait = self.sleep_for(attempt, rate_limited);
                    if rate_limited {
                        tracing::warn!(
                            "{} rate limited, waiting {:?} (attempt {}/{}): {}",
                            label,
                            wait,
                            attempt,
                            self.max_attempts,
                            err
                        );
                    } else {
                        tracing::warn!(
                            "{} attempt {}/{} failed, retrying in {:?}: {}",
                            label,
                            attempt,
                            self.max_attempts,
                            wait,
                            err
                        );
                    }

                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            rate_limit_factor: 5,
            jitter: true,
        }
    }
}

/// Heuristic rate-limit detection on an API response body.
///
/// Only meant for text the remote service wrote; request URLs routinely
/// contain "rate" (`/videos/the-pirate`).
pub fn looks_rate_limited(message: &str) -> bool {
    message.contains("429") || message.to_lowercase().contains("rate")
}
