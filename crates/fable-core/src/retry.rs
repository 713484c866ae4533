//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Only transient failures (quota exhaustion, timeouts) are retried. The
//! delay before attempt `n + 1` is `initial_backoff_ms * multiplier^(n - 1)`,
//! capped at `max_backoff_ms`. Sleeping goes through a [`Sleeper`] so tests
//! can observe the schedule without waiting.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Retry schedule for collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Growth factor applied to the delay after each retry.
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = u64::from(self.multiplier).saturating_pow(exponent);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `is_transient` decides which errors are worth retrying. The last
    /// error is returned when attempts are exhausted.
    pub fn run<T, E, F, P>(&self, sleeper: &dyn Sleeper, mut call: F, is_transient: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: core::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt: u32 = 1;
        loop {
            match call(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        attempt = attempt,
                        max_attempts = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient collaborator failure, retrying"
                    );
                    sleeper.sleep(delay);
                    attempt = attempt.saturating_add(1);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Something that can pause the current thread.
pub trait Sleeper {
    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

const fn default_multiplier() -> u32 {
    2
}
