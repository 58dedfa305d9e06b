use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a poller does after a status fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// Give up on the first failure and leave the record as last seen.
    #[default]
    StopOnFailure,
    /// Keep polling after failures, waiting an extra, doubling delay before
    /// the next tick. Stops after `max_attempts` consecutive failures.
    Backoff {
        max_attempts: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Stop,
    RetryAfter(Duration),
}

impl RetryPolicy {
    /// Decision after `consecutive_failures` failed fetches in a row (1-based).
    pub fn after_failure(&self, consecutive_failures: u32) -> RetryDecision {
        match *self {
            RetryPolicy::StopOnFailure => RetryDecision::Stop,
            RetryPolicy::Backoff {
                max_attempts,
                initial_delay_ms,
                max_delay_ms,
            } => {
                if consecutive_failures >= max_attempts {
                    return RetryDecision::Stop;
                }
                let exponent = consecutive_failures.saturating_sub(1).min(16);
                let delay = initial_delay_ms
                    .saturating_mul(1u64 << exponent)
                    .min(max_delay_ms);
                RetryDecision::RetryAfter(Duration::from_millis(delay))
            }
        }
    }
}
