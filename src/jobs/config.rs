//! Configuration for background job system

use std::time::Duration;

/// Worker pool size and retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsConfig {
    /// Number of worker tasks to spawn
    pub worker_count: usize,
    /// Attempts after the first one before a job is parked as failed
    pub max_retries: u32,
    /// Base retry backoff in seconds (exponential backoff: base * 2^retry_count)
    pub retry_backoff_seconds: u64,
    /// Idle delay between polls of an empty queue
    pub poll_interval_ms: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            max_retries: 3,
            retry_backoff_seconds: 5,
            poll_interval_ms: 100,
        }
    }
}

impl JobsConfig {
    /// Delay before the retry that follows `retry_count` earlier retries.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let factor = 2_u64.checked_pow(retry_count).unwrap_or(u64::MAX);
        Duration::from_secs(self.retry_backoff_seconds.saturating_mul(factor))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
