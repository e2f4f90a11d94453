//! Minute-aligned timing rules for the trade lifecycle

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use signal_config::TradingConfig;
use std::ops::RangeInclusive;

/// Wall-clock instant seen by one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTime {
    /// Local wall-clock time, used for the minute and day boundaries
    pub local: NaiveDateTime,
    /// Unix epoch milliseconds, used for timestamps on events and records
    pub epoch_ms: i64,
}

impl TickTime {
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            local: now.naive_local(),
            epoch_ms: now.timestamp_millis(),
        }
    }

    /// Instant for a UTC wall clock, mainly for tests and replays
    pub fn from_utc(local: NaiveDateTime) -> Self {
        Self {
            local,
            epoch_ms: local.and_utc().timestamp_millis(),
        }
    }

    pub fn second(&self) -> u32 {
        self.local.second()
    }

    pub fn day(&self) -> NaiveDate {
        self.local.date()
    }

    /// Minute index on the epoch timeline, unaffected by local clock repeats
    pub fn minute_key(&self) -> i64 {
        self.epoch_ms.div_euclid(60_000)
    }
}

/// Announce window plus the once-per-minute close guard
#[derive(Debug, Clone)]
pub struct MinuteClock {
    announce: RangeInclusive<u32>,
    exit_second: u32,
    last_closed_minute: Option<i64>,
}

impl MinuteClock {
    pub fn new(config: &TradingConfig) -> Self {
        Self {
            announce: config.announce_start_second..=config.announce_end_second,
            exit_second: config.exit_second,
            last_closed_minute: None,
        }
    }

    pub fn in_announce_window(&self, now: &TickTime) -> bool {
        self.announce.contains(&now.second())
    }

    /// True exactly once per minute, on the first tick at the exit second.
    ///
    /// Any minute key other than the last closed one closes, so a clock
    /// stepped backwards keeps forcing exits.
    pub fn should_close(&mut self, now: &TickTime) -> bool {
        if now.second() != self.exit_second {
            return false;
        }
        let key = now.minute_key();
        if self.last_closed_minute == Some(key) {
            return false;
        }
        self.last_closed_minute = Some(key);
        true
    }

    pub fn last_closed_minute(&self) -> Option<i64> {
        self.last_closed_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> TickTime {
        let local = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, 250)
            .unwrap();
        TickTime::from_utc(local)
    }

    #[test]
    fn test_announce_window_bounds() {
        let clock = MinuteClock::new(&TradingConfig::default());
        assert!(!clock.in_announce_window(&at(12, 0, 0)));
        assert!(clock.in_announce_window(&at(12, 0, 1)));
        assert!(clock.in_announce_window(&at(12, 0, 25)));
        assert!(!clock.in_announce_window(&at(12, 0, 26)));
    }

    #[test]
    fn test_close_fires_once_per_minute() {
        let mut clock = MinuteClock::new(&TradingConfig::default());
        assert!(!clock.should_close(&at(12, 0, 59)));
        assert!(clock.should_close(&at(12, 1, 0)));
        assert!(!clock.should_close(&at(12, 1, 0)));
        assert!(!clock.should_close(&at(12, 1, 1)));
        assert!(clock.should_close(&at(12, 2, 0)));
        assert_eq!(clock.last_closed_minute(), Some(at(12, 2, 0).minute_key()));
    }

    #[test]
    fn test_close_continues_through_repeated_local_hour() {
        let mut clock = MinuteClock::new(&TradingConfig::default());
        let start = at(1, 59, 0);
        assert!(clock.should_close(&start));

        // Local time falls back one hour while the epoch keeps advancing
        let mut closes = 0;
        for minute in 0..60 {
            let tick = TickTime {
                local: NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_hms_opt(1, minute, 0)
                    .unwrap(),
                epoch_ms: start.epoch_ms + (minute as i64 + 1) * 60_000,
            };
            if clock.should_close(&tick) {
                closes += 1;
            }
            assert!(!clock.should_close(&tick));
        }
        assert_eq!(closes, 60);
    }

    #[test]
    fn test_close_after_clock_steps_back() {
        let mut clock = MinuteClock::new(&TradingConfig::default());
        assert!(clock.should_close(&at(12, 5, 0)));
        assert!(clock.should_close(&at(12, 3, 0)));
        assert!(!clock.should_close(&at(12, 3, 0)));
    }

    #[test]
    fn test_minute_key_is_monotonic() {
        assert_eq!(at(12, 0, 0).minute_key() + 1, at(12, 1, 59).minute_key());
        assert!(at(23, 59, 0).minute_key() < TickTime::from_utc(
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
        ).minute_key());
    }
}
