use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate};

use crate::model::Ms;

/// Source of "now" for the engine. Admission and cancellation rules compare
/// against today's date, so tests swap in a [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Ms;

    fn today(&self) -> NaiveDate {
        date_of(self.now_ms())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Ms {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: Ms) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Clock standing at 12:00 UTC on the given day.
    pub fn at_noon(day: NaiveDate) -> Self {
        Self::new(midnight_ms(day) + 12 * 3_600_000)
    }

    pub fn set(&self, now: Ms) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Ms) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> Ms {
        self.now.load(Ordering::SeqCst)
    }
}

/// UTC calendar date containing the instant.
pub fn date_of(ms: Ms) -> NaiveDate {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Unix ms of 00:00 UTC on the given day.
pub fn midnight_ms(day: NaiveDate) -> Ms {
    day.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn fixed_clock_today() {
        let clock = FixedClock::at_noon(d("2025-06-01"));
        assert_eq!(clock.today(), d("2025-06-01"));
        clock.advance(12 * 3_600_000);
        assert_eq!(clock.today(), d("2025-06-02")); // midnight rolls over
    }

    #[test]
    fn midnight_and_date_agree() {
        let day = d("2024-02-29");
        assert_eq!(date_of(midnight_ms(day)), day);
        assert_eq!(date_of(midnight_ms(day) - 1), d("2024-02-28"));
    }

    #[test]
    fn system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
