use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::FetchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base: Duration::from_secs(1),
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: config.backoff_base(),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt`; attempts count from 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }
}

/// Retry bookkeeping of a single generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub next_delay: Option<Duration>,
}

impl RetryState {
    /// Books the next retry, or returns `None` once the budget is spent.
    pub fn advance(&mut self, policy: &RetryPolicy) -> Option<Duration> {
        if self.attempt >= policy.max_retries {
            self.next_delay = None;
            return None;
        }
        self.attempt += 1;
        let delay = policy.delay_for(self.attempt);
        self.next_delay = Some(delay);
        Some(delay)
    }
}

/// Waits `delay` unless `cancel` fires first. Returns whether the full delay elapsed.
pub async fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => !cancel.is_cancelled(),
    }
}
