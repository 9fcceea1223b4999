//! Aptner Backoff
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! aptner-internals/backoff
//! A bounded attempt budget with an exponential backoff curve for external service calls.
//!
//! The schedule only answers "how many attempts" and "how long to wait after attempt N".
//! Deciding *whether* a failure is worth retrying is left to the caller.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use tokio::time;

/// Exponential backoff schedule over a fixed number of attempts
///
/// Attempt indices are 0-based. The delay after attempt `n` is
/// `initial_delay * multiplier^n`, capped at `max_delay`, plus optional jitter.
///
/// # Examples
///
/// ```ignore
/// let backoff = Backoff::default(); // 3 attempts, 1s, 2s, 4s ...
/// for attempt in backoff.attempts() {
///     // ...
///     if !backoff.is_last(attempt) {
///         backoff.wait(attempt).await;
///     }
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Backoff {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: u32,
    jitter_factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            jitter_factor: 0.0,
        }
    }
}

impl Backoff {
    /// Create a schedule with `max_attempts` attempts starting at `initial_delay`
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            ..Default::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier.max(1);
        self
    }

    /// Add up to `factor * delay` of random extra wait. Clamped to `0.0..=1.0`.
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter_factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Attempt indices of the budget, `0..max_attempts`
    pub fn attempts(&self) -> Range<u32> {
        0..self.max_attempts
    }

    /// Whether `attempt` is the final one of the budget
    pub fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }

    /// Un-jittered delay to wait after `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.multiplier
            .checked_pow(attempt)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Sleep for the (jittered) delay after `attempt` and return how long was waited
    pub async fn wait(&self, attempt: u32) -> Duration {
        let delay = self.apply_jitter(self.delay_for(attempt));
        time::sleep(delay).await;
        delay
    }

    /// Apply jitter to the delay
    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor == 0.0 {
            return delay;
        }

        let jitter_ms = (delay.as_millis() as f64 * self.jitter_factor) as u64;
        let rand_jitter = rand::thread_rng().gen_range(0..=jitter_ms);

        delay + Duration::from_millis(rand_jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_curve_doubles_from_one_second() {
        let backoff = Backoff::default();
        assert_eq!(backoff.max_attempts(), 3);
        assert_eq!(backoff.delay_for(0), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(1), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn delay_is_capped() {
        let backoff =
            Backoff::new(10, Duration::from_millis(500)).with_max_delay(Duration::from_secs(3));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(3));
        // 2^40 overflows u32: falls back to the cap
        assert_eq!(backoff.delay_for(40), Duration::from_secs(3));
    }

    #[test]
    fn custom_multiplier_and_base() {
        let backoff = Backoff::new(4, Duration::from_millis(200)).with_multiplier(3);
        assert_eq!(backoff.initial_delay(), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(0), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(1800));
        // a zero multiplier is bumped to 1: constant delay
        let flat = Backoff::new(3, Duration::from_secs(1)).with_multiplier(0);
        assert_eq!(flat.delay_for(2), Duration::from_secs(1));
    }

    #[test]
    fn last_attempt_detection() {
        let backoff = Backoff::new(3, Duration::from_secs(1));
        assert_eq!(backoff.attempts().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(!backoff.is_last(0));
        assert!(!backoff.is_last(1));
        assert!(backoff.is_last(2));
    }

    #[test]
    fn zero_attempts_is_bumped_to_one() {
        let backoff = Backoff::new(0, Duration::from_secs(1));
        assert_eq!(backoff.max_attempts(), 1);
        assert!(backoff.is_last(0));
    }

    #[test]
    fn jitter_stays_within_factor() {
        let backoff = Backoff::default().with_jitter(0.5);
        let base = Duration::from_secs(2);
        for _ in 0..100 {
            let jittered = backoff.apply_jitter(base);
            assert!(jittered >= base);
            assert!(jittered <= base + Duration::from_secs(1));
        }
    }

    #[test]
    fn bad_jitter_factor_is_sanitised() {
        let backoff = Backoff::default().with_jitter(f64::NAN);
        assert_eq!(backoff.apply_jitter(Duration::from_secs(1)), Duration::from_secs(1));
        let backoff = Backoff::default().with_jitter(7.0);
        assert!(backoff.apply_jitter(Duration::from_secs(1)) <= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sleeps_for_the_scheduled_delay() {
        let backoff = Backoff::default();
        let start = time::Instant::now();
        let waited = backoff.wait(1).await;
        assert_eq!(waited, Duration::from_secs(2));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "slept only {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2100), "slept {:?}", elapsed);
    }
}
