// src/retry.rs

//! Bounded exponential-backoff retry for external operations.
//!
//! Every scheduler and transfer call in the crate goes through
//! [`execute`]. The policy is a pure value; the sleep itself sits behind
//! the [`Sleeper`] trait so tests can record delays instead of waiting
//! out multi-minute backoffs.

use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{ConveyorError, Result};

/// Retry policy: attempt count plus backoff shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(4),
            multiplier: 4,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-based):
    /// `base_delay * multiplier^attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(attempt)
    }
}

/// Trait abstracting how backoff delays are waited out.
///
/// Production code uses [`ThreadSleeper`]; tests can substitute an
/// implementation that records the requested durations.
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration);
}

/// Real sleeper: blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    pub slept: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.slept.push(duration);
    }
}

/// Run `operation` up to `policy.max_attempts` times.
///
/// Returns the first `Ok` immediately. Each failed attempt is logged
/// with its attempt number; between attempts the sleeper waits
/// `policy.delay_after(attempt)`. After the final attempt fails the
/// last underlying error is surfaced as [`ConveyorError::Exhausted`],
/// which is fatal to the caller.
pub fn execute<T, F>(
    mut operation: F,
    policy: &RetryPolicy,
    sleeper: &mut dyn Sleeper,
) -> Result<T>
where
    F: FnMut() -> anyhow::Result<T>,
{
    let mut last_err = anyhow::anyhow!("retry policy allows no attempts");

    for attempt in 1..=policy.max_attempts {
        match operation() {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "operation attempt failed"
                );
                last_err = err;

                if attempt < policy.max_attempts {
                    let delay = policy.delay_after(attempt);
                    debug!(attempt, delay_secs = delay.as_secs(), "backing off");
                    sleeper.sleep(delay);
                }
            }
        }
    }

    Err(ConveyorError::Exhausted {
        attempts: policy.max_attempts,
        source: last_err,
    })
}
