//! Time source for day-delta calculations.
//!
//! Derivations that depend on "now" take a [`Clock`] instead of reading the system time, so a
//! dashboard can be rendered as of a fixed date and tests stay deterministic.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Whole days elapsed since midnight UTC on `date`, rounded down.
    ///
    /// Dates in the future yield negative values.
    fn days_since(&self, date: NaiveDate) -> i64 {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        (self.now() - start).num_seconds().div_euclid(SECONDS_PER_DAY)
    }
}

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a single instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }

    /// Pins the clock to midnight UTC at the start of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_since_counts_whole_days() {
        let clock = FixedClock::at_date(date(2024, 11, 10));
        assert_eq!(clock.days_since(date(2024, 11, 10)), 0);
        assert_eq!(clock.days_since(date(2024, 11, 6)), 4);
        assert_eq!(clock.days_since(date(2024, 10, 31)), 10);
    }

    #[test]
    fn days_since_rounds_down_within_a_day() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 11, 10, 23, 59, 0).unwrap());
        assert_eq!(clock.days_since(date(2024, 11, 10)), 0);
        assert_eq!(clock.days_since(date(2024, 11, 9)), 1);
    }

    #[test]
    fn future_dates_are_negative() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 11, 10, 12, 0, 0).unwrap());
        assert_eq!(clock.days_since(date(2024, 11, 11)), -1);
    }

    #[test]
    fn today_follows_now() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap());
        assert_eq!(clock.today(), date(2025, 1, 2));
    }
}
