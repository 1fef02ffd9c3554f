//! Backoff delay curve used between ping attempts.

use rand::Rng;
use std::time::Duration;

/// Quadratic backoff with a cap and a small jitter band.
///
/// The defaults match the wire behavior of the engine (seconds-scale delays,
/// 64 s cap, 2 s ping deadline); tests shrink `unit` to run in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay unit: attempt n waits n² units before jitter.
    pub unit: Duration,
    /// Upper bound on the raw delay.
    pub max_delay: Duration,
    /// Sub-deadline applied to each individual ping call.
    pub ping_timeout: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max_delay: Duration::from_secs(64),
            ping_timeout: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    /// Raw delay after the given attempt: `min(attempt² × unit, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.unit.saturating_mul(attempt.saturating_mul(attempt));
        raw.min(self.max_delay)
    }

    /// Delay perturbed by ±5% so concurrent callers do not retry in lockstep.
    pub fn jittered(&self, delay: Duration) -> Duration {
        let factor = 0.95 + rand::thread_rng().gen::<f64>() * 0.10;
        delay.mul_f64(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_quadratically_and_caps() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(9));
        assert_eq!(policy.delay_for(8), Duration::from_secs(64));
        // Past the cap.
        assert_eq!(policy.delay_for(9), Duration::from_secs(64));
        assert_eq!(policy.delay_for(1000), Duration::from_secs(64));
    }

    #[test]
    fn jitter_stays_within_five_percent() {
        let policy = BackoffPolicy::default();
        let base = Duration::from_secs(10);
        for _ in 0..100 {
            let jittered = policy.jittered(base);
            assert!(jittered >= base.mul_f64(0.95));
            assert!(jittered <= base.mul_f64(1.05));
        }
    }
}
