use std::time::Duration;

use crate::config::FeedConfig;

/// Request pacing and backoff state for one fetch loop.
///
/// Owned by the paginator and mutated only through it; nothing here is
/// process-wide.
#[derive(Debug, Clone)]
pub struct RateState {
    pub sleep_base: Duration,
    pub sleep_jitter: Duration,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    pub backoff_factor: f64,
    consecutive_failures: u32,
}

impl RateState {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            sleep_base: config.sleep_base,
            sleep_jitter: config.sleep_jitter,
            backoff_initial: config.backoff_initial,
            backoff_max: config.backoff_max,
            backoff_factor: 2.0,
            consecutive_failures: 0,
        }
    }

    /// Delay to wait before any request.
    pub fn pacing_delay(&self) -> Duration {
        self.sleep_base + jitter(self.sleep_jitter)
    }

    /// Capped exponential delay for the given zero-based attempt, without jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs = self.backoff_initial.as_secs_f64()
            * self.backoff_factor.powi(attempt.min(64) as i32);
        Duration::from_secs_f64(delay_secs.min(self.backoff_max.as_secs_f64()))
    }

    /// Registers a transient failure and returns how long to back off.
    /// Jitter adds up to a quarter of the capped delay.
    pub fn record_failure(&mut self) -> Duration {
        let delay = self.delay_for_attempt(self.consecutive_failures);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay + jitter(delay / 4)
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

impl Default for RateState {
    fn default() -> Self {
        Self::new(&FeedConfig::default())
    }
}

fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    max.mul_f64(rand::random::<f64>())
}
