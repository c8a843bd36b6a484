//! Retry policy with exponential backoff.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Backoff schedule for transient request failures.
///
/// Applied structurally around each network call: the caller asks for the
/// delay after attempt N rather than the policy wrapping the call itself.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Growth factor per attempt.
    pub multiplier: f64,

    /// Upper bound on any single delay.
    pub max_delay: Duration,

    /// Jitter as a fraction of the computed delay (0.0 disables it).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Whether another attempt is permitted after the zero-based `attempt`.
    pub fn attempts_left(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Delay before retrying after the zero-based `attempt`:
    /// `base * multiplier^attempt`, jittered, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let nominal = self.base_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = nominal.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(apply_jitter(capped, self.jitter) as u64)
    }
}

/// Spread a delay by up to ±`jitter` of its value so synchronized clients do
/// not retry in lockstep. The offset comes from the clock's subsecond nanos,
/// which is enough entropy for backoff spreading.
fn apply_jitter(delay_ms: f64, jitter: f64) -> f64 {
    if jitter <= 0.0 {
        return delay_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let unit = (nanos % 10_000) as f64 / 10_000.0;
    let spread = (unit * 2.0 - 1.0) * jitter;
    (delay_ms * (1.0 + spread)).max(0.0)
}
