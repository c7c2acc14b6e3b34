//! Fibonacci retry backoff
//!
//! Delays between retries of a failing reconciliation grow along the
//! Fibonacci sequence (1m, 1m, 2m, 3m, 5m, 8m, capped at 10m), which ramps
//! up more gently than doubling while still backing off persistent
//! failures. State is kept per resource and reset on the first success.

use std::time::Duration;

/// Per-resource retry delay generator.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    base: Duration,
    cap: Duration,
    previous: Duration,
    current: Duration,
}

impl FibonacciBackoff {
    /// Creates a backoff starting at `base` and saturating at `cap`.
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            previous: Duration::ZERO,
            current: base,
        }
    }

    /// Policy used for reconcile retries: one minute base, ten minute cap.
    pub fn default_policy() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(600))
    }

    /// Returns the next delay and advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let following = self.previous + self.current;
        self.previous = self.current;
        self.current = following.min(self.cap);
        delay
    }

    /// Restarts the sequence from the base delay.
    pub fn reset(&mut self) {
        self.previous = Duration::ZERO;
        self.current = self.base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: u64 = 60;

    #[test]
    fn test_delays_follow_the_fibonacci_sequence() {
        let mut backoff = FibonacciBackoff::default_policy();

        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(
            delays,
            [MINUTE, MINUTE, 2 * MINUTE, 3 * MINUTE, 5 * MINUTE, 8 * MINUTE, 10 * MINUTE]
        );
    }

    #[test]
    fn test_delays_saturate_at_the_cap() {
        let mut backoff = FibonacciBackoff::default_policy();
        for _ in 0..10 {
            backoff.next_delay();
        }

        assert_eq!(backoff.next_delay().as_secs(), 10 * MINUTE);
        assert_eq!(backoff.next_delay().as_secs(), 10 * MINUTE);
    }

    #[test]
    fn test_reset_restarts_from_the_base_delay() {
        let mut backoff = FibonacciBackoff::default_policy();
        backoff.next_delay();
        backoff.next_delay();
        backoff.next_delay();

        backoff.reset();

        assert_eq!(backoff.next_delay().as_secs(), MINUTE);
        assert_eq!(backoff.next_delay().as_secs(), MINUTE);
        assert_eq!(backoff.next_delay().as_secs(), 2 * MINUTE);
    }
}
