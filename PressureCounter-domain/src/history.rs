//! Grouping of measurements by calendar day for history lists

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate, TimeZone};
use tracing::warn;

use pressure_counter_data::Measurement;

/// Heading shown above a day of measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl DayLabel {
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            DayLabel::Today
        } else if today.checked_sub_days(Days::new(1)) == Some(date) {
            DayLabel::Yesterday
        } else {
            DayLabel::Date(date)
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLabel::Today => write!(f, "Today"),
            DayLabel::Yesterday => write!(f, "Yesterday"),
            DayLabel::Date(date) => write!(f, "{}", date.format("%-d %B %Y")),
        }
    }
}

/// Measurements recorded on one local calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub measurements: Vec<Measurement>,
}

impl DayGroup {
    pub fn label(&self, today: NaiveDate) -> DayLabel {
        DayLabel::for_date(self.date, today)
    }
}

/// Group `measurements` by local date in `tz`, newest day first
///
/// Within a day the input order is kept. Measurements whose timestamp has no
/// calendar representation are skipped.
pub fn group_by_day<'a, I, Tz>(measurements: I, tz: &Tz) -> Vec<DayGroup>
where
    I: IntoIterator<Item = &'a Measurement>,
    Tz: TimeZone,
{
    let mut days: BTreeMap<NaiveDate, Vec<Measurement>> = BTreeMap::new();
    for measurement in measurements {
        match tz.timestamp_millis_opt(measurement.timestamp).single() {
            Some(at) => days.entry(at.date_naive()).or_default().push(measurement.clone()),
            None => warn!("Skipping measurement {} without a calendar date", measurement.id),
        }
    }

    days.into_iter()
        .rev()
        .map(|(date, measurements)| DayGroup { date, measurements })
        .collect()
}
