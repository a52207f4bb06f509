use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryDecision, RetryPolicy};
use std::time::{Duration, SystemTime};

/// Retry policy applied by the coordinator around a single push.
///
/// The pusher itself never retries; with `max_retries == 0` a failed push is
/// left for the next trigger.
pub struct PushRetryPolicy {
    backoff: ExponentialBackoff,
    max_retries: u32,
}

impl PushRetryPolicy {
    /// Exponential backoff between `min_delay` and `max_delay` (requires `min_delay <= max_delay`)
    pub fn new(max_retries: u32, min_delay: Duration, max_delay: Duration) -> Self {
        let backoff = ExponentialBackoff::builder()
            .retry_bounds(min_delay, max_delay)
            .build_with_max_retries(max_retries);

        Self {
            backoff,
            max_retries,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::from_millis(500), Duration::from_secs(5))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay to wait before the next attempt, or `None` once retries are exhausted
    pub fn next_delay(&self, started_at: SystemTime, past_retries: u32) -> Option<Duration> {
        match self.backoff.should_retry(started_at, past_retries) {
            RetryDecision::Retry { execute_after } => Some(
                execute_after
                    .duration_since(SystemTime::now())
                    .unwrap_or_default(),
            ),
            RetryDecision::DoNotRetry => None,
        }
    }
}

impl Default for PushRetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}
