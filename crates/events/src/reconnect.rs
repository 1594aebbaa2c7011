//! Backoff schedule for resubscribing to the car change feed.
//!
//! After a failed or dropped subscription the fan-out waits
//! `initial_delay`, then a `factor` times longer after every further failure,
//! never more than `max_delay`. A subscription that succeeds resets the
//! schedule, so a feed that drops once an hour always retries after
//! `initial_delay`.

use std::time::Duration;

/// Resubscription timing for [`RealtimeFanout`](crate::RealtimeFanout).
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor between consecutive failures.
    pub factor: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            factor: 2,
        }
    }
}

impl ReconnectConfig {
    /// A fresh schedule starting at `initial_delay`.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
            config: self.clone(),
        }
    }
}

/// Delay schedule for one running fan-out.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    next: Duration,
}

impl Backoff {
    /// The delay to wait before the next attempt. Advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = delay
            .saturating_mul(self.config.factor.max(1))
            .min(self.config.max_delay);
        delay
    }

    /// Start over from `initial_delay` after a successful subscription.
    pub fn reset(&mut self) {
        self.next = self.config.initial_delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(backoff: &mut Backoff, n: usize) -> Vec<u64> {
        (0..n).map(|_| backoff.next_delay().as_secs()).collect()
    }

    #[test]
    fn grows_until_capped() {
        let mut backoff = ReconnectConfig::default().backoff();
        assert_eq!(secs(&mut backoff, 7), [1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn reset_returns_to_initial_delay() {
        let mut backoff = ReconnectConfig::default().backoff();
        secs(&mut backoff, 4);

        backoff.reset();
        assert_eq!(secs(&mut backoff, 2), [1, 2]);
    }

    #[test]
    fn factor_of_zero_keeps_a_constant_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(250),
            factor: 0,
            ..Default::default()
        };
        let mut backoff = config.backoff();

        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
    }
}
