//! Bounded reconnect backoff
//!
//! Delays follow a fixed schedule. Attempt `n` (1-based) waits
//! `schedule[min(n, len) - 1]`, so once the schedule is exhausted every further
//! attempt reuses the last delay. There is no attempt limit. A successful open
//! resets the counter.

use std::time::Duration;

/// Delay used only if the schedule is empty
pub const FALLBACK_DELAY: Duration = Duration::from_millis(15_000);

#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    schedule: Vec<Duration>,
    attempts: usize,
}

impl ReconnectBackoff {
    pub fn new(schedule_ms: &[u64]) -> Self {
        Self {
            schedule: schedule_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            attempts: 0,
        }
    }

    /// Register a failed attempt and return how long to wait before the next one
    pub fn next_delay(&mut self) -> Duration {
        if self.attempts < self.schedule.len() {
            self.attempts += 1;
        }
        self.attempts
            .checked_sub(1)
            .and_then(|idx| self.schedule.get(idx))
            .copied()
            .unwrap_or(FALLBACK_DELAY)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Failed attempts since the last successful open, capped at the schedule length
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_followed_then_capped() {
        let mut backoff = ReconnectBackoff::new(&[1000, 2000, 5000, 8000, 12000]);
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 5000, 8000, 12000, 12000, 12000]);
        assert_eq!(backoff.attempts(), 5);
    }

    #[test]
    fn test_reset_on_open() {
        let mut backoff = ReconnectBackoff::new(&[1000, 2000]);
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_empty_schedule_uses_fallback() {
        let mut backoff = ReconnectBackoff::new(&[]);
        assert_eq!(backoff.next_delay(), FALLBACK_DELAY);
    }
}
