//! Time windows for "last week / month / year" queries
//!
//! Month and year windows use calendar arithmetic in the caller's time zone.
//! When the target month is shorter than the current day of month the day is
//! clamped to the last day of that month, so one month before 2024-03-31 is
//! 2024-02-29 and one year before 2024-02-29 is 2023-02-28.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Days, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Look-back period ending at "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// The last 7 calendar days
    Week,
    /// The last calendar month
    Month,
    /// The last calendar year
    Year,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [TimeWindow::Week, TimeWindow::Month, TimeWindow::Year];

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Start of `window` when it ends at `now`
///
/// Returns `None` only when the result would leave chrono's supported range.
pub fn window_start<Tz: TimeZone>(now: DateTime<Tz>, window: TimeWindow) -> Option<DateTime<Tz>> {
    match window {
        TimeWindow::Week => now.checked_sub_days(Days::new(7)),
        TimeWindow::Month => now.checked_sub_months(Months::new(1)),
        TimeWindow::Year => now.checked_sub_months(Months::new(12)),
    }
}

/// Millisecond form of [`window_start`], evaluated in `tz`
///
/// An instant outside chrono's range yields `i64::MIN`, i.e. a window that
/// covers every stored measurement.
pub fn window_start_millis<Tz: TimeZone>(now_millis: i64, window: TimeWindow, tz: &Tz) -> i64 {
    tz.timestamp_millis_opt(now_millis)
        .single()
        .and_then(|now| window_start(now, window))
        .map(|start| start.timestamp_millis())
        .unwrap_or(i64::MIN)
}

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant in milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for deterministic tests
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    /// Clock fixed at the given UTC instant
    pub fn at<Tz: TimeZone>(instant: DateTime<Tz>) -> Self {
        Self::new(instant.timestamp_millis())
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .map(|naive| naive.and_utc())
            .unwrap()
    }

    #[test]
    fn test_week_window() {
        let start = window_start(utc(2024, 3, 5, 10, 30), TimeWindow::Week).unwrap();
        assert_eq!(start, utc(2024, 2, 27, 10, 30));
    }

    #[test]
    fn test_month_window_clamps_day() {
        let start = window_start(utc(2024, 3, 31, 12, 0), TimeWindow::Month).unwrap();
        assert_eq!(start, utc(2024, 2, 29, 12, 0));

        let start = window_start(utc(2023, 3, 31, 12, 0), TimeWindow::Month).unwrap();
        assert_eq!(start, utc(2023, 2, 28, 12, 0));

        // Not a fixed 30 days
        let start = window_start(utc(2024, 1, 31, 8, 0), TimeWindow::Month).unwrap();
        assert_eq!(start, utc(2023, 12, 31, 8, 0));
    }

    #[test]
    fn test_year_window_clamps_leap_day() {
        let start = window_start(utc(2024, 2, 29, 9, 15), TimeWindow::Year).unwrap();
        assert_eq!(start, utc(2023, 2, 28, 9, 15));

        let start = window_start(utc(2024, 6, 1, 0, 0), TimeWindow::Year).unwrap();
        assert_eq!(start, utc(2023, 6, 1, 0, 0));
    }

    #[test]
    fn test_window_respects_time_zone() {
        // 2024-04-01 02:00 at +03:00 is still 2024-03-31 in UTC
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 4, 1, 2, 0, 0).unwrap();

        let local = window_start_millis(now.timestamp_millis(), TimeWindow::Month, &tz);
        let expected = tz.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(local, expected.timestamp_millis());

        let in_utc = window_start_millis(now.timestamp_millis(), TimeWindow::Month, &Utc);
        assert_eq!(in_utc, utc(2024, 2, 29, 23, 0).timestamp_millis());
    }

    #[test]
    fn test_window_millis_out_of_range() {
        assert_eq!(window_start_millis(i64::MAX, TimeWindow::Week, &Utc), i64::MIN);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::at(utc(2024, 3, 31, 0, 0));
        let start = clock.now_millis();
        clock.advance(1_000);
        assert_eq!(clock.now_millis(), start + 1_000);
        clock.set(42);
        assert_eq!(clock.now_millis(), 42);
    }
}
