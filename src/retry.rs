//! Exponential backoff with jitter for provider calls that need time to
//! become consistent.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default settle delay and first backoff delay, in seconds.
pub const DEFAULT_DELAY_SECS: u64 = 10;

/// Default upper bound of the random jitter, in seconds.
pub const DEFAULT_MAX_JITTER_SECS: u64 = 9;

/// Retry policy with exponential backoff and random jitter.
///
/// After a failed attempt the policy sleeps for the current delay, then the
/// delay becomes `delay * multiplier + jitter` where jitter is drawn from
/// whole seconds in `0..=max_jitter`. Delays therefore never decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least one attempt is always made).
    pub max_attempts: u32,
    /// Delay before the first attempt.
    pub settle_delay: Duration,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Growth factor applied to the delay after each failure.
    pub multiplier: u32,
    /// Upper bound of the random jitter added to each grown delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle_delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            initial_delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            multiplier: 2,
            max_jitter: Duration::from_secs(DEFAULT_MAX_JITTER_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            settle_delay: Duration::ZERO,
            initial_delay: Duration::ZERO,
            multiplier: 1,
            max_jitter: Duration::ZERO,
        }
    }

    /// Sets the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first attempt.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the delay after the first failed attempt.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound of the random jitter.
    #[must_use]
    pub const fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Computes the delay that follows `current`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        let max_jitter_secs = self.max_jitter.as_secs();
        let jitter = if max_jitter_secs == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(rand::thread_rng().gen_range(0..=max_jitter_secs))
        };

        current
            .saturating_mul(self.multiplier.max(1))
            .saturating_add(jitter)
    }

    /// Runs `operation` until it succeeds or the attempts are exhausted.
    ///
    /// Returns the first success, or the error of the last attempt.
    ///
    /// # Errors
    ///
    /// Returns the last error once every attempt has failed.
    pub async fn retry<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut delay = self.initial_delay;

        if !self.settle_delay.is_zero() {
            debug!("Waiting {:?} before {label}", self.settle_delay);
            tokio::time::sleep(self.settle_delay).await;
        }

        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    debug!("{label} succeeded on attempt {attempt}/{max_attempts}");
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    warn!("{label} failed after {attempt} attempts: {e}");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "{label} failed (attempt {attempt}/{max_attempts}), retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
            }
        }
    }
}
