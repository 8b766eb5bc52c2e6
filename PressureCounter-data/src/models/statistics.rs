use serde::{Deserialize, Serialize};

use super::measurement::Measurement;

/// Aggregates over the measurements of a time range
///
/// Every field is `None` when the range holds no measurements, so "no data"
/// never looks like a range of zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Average systolic pressure
    pub avg_systolic: Option<f64>,

    /// Average diastolic pressure
    pub avg_diastolic: Option<f64>,

    /// Average pulse rate
    pub avg_pulse: Option<f64>,

    /// Lowest systolic reading
    pub min_systolic: Option<i32>,

    /// Highest systolic reading
    pub max_systolic: Option<i32>,

    /// Lowest diastolic reading
    pub min_diastolic: Option<i32>,

    /// Highest diastolic reading
    pub max_diastolic: Option<i32>,

    /// Lowest pulse rate
    pub min_pulse: Option<i32>,

    /// Highest pulse rate
    pub max_pulse: Option<i32>,

    /// Number of measurements aggregated
    pub record_count: usize,
}

impl Statistics {
    /// Statistics of an empty range
    pub fn empty() -> Self {
        Self::default()
    }

    /// Aggregate a set of measurements in-process
    ///
    /// The result does not depend on the order of `measurements`. Sums are
    /// accumulated as i64 so the division is the only floating-point step.
    pub fn from_measurements<'a, I>(measurements: I) -> Self
    where
        I: IntoIterator<Item = &'a Measurement>,
    {
        let mut count: usize = 0;
        let mut sum_systolic: i64 = 0;
        let mut sum_diastolic: i64 = 0;
        let mut sum_pulse: i64 = 0;

        let mut systolic = MinMax::default();
        let mut diastolic = MinMax::default();
        let mut pulse = MinMax::default();

        for measurement in measurements {
            count += 1;
            sum_systolic += i64::from(measurement.systolic);
            sum_diastolic += i64::from(measurement.diastolic);
            sum_pulse += i64::from(measurement.pulse);

            systolic.push(measurement.systolic);
            diastolic.push(measurement.diastolic);
            pulse.push(measurement.pulse);
        }

        if count == 0 {
            return Self::empty();
        }

        let divisor = count as f64;
        Self {
            avg_systolic: Some(sum_systolic as f64 / divisor),
            avg_diastolic: Some(sum_diastolic as f64 / divisor),
            avg_pulse: Some(sum_pulse as f64 / divisor),
            min_systolic: systolic.min,
            max_systolic: systolic.max,
            min_diastolic: diastolic.min,
            max_diastolic: diastolic.max,
            min_pulse: pulse.min,
            max_pulse: pulse.max,
            record_count: count,
        }
    }

    /// Whether at least one measurement fell in the range
    pub fn has_data(&self) -> bool {
        self.avg_systolic.is_some()
    }

    /// Average pulse pressure, derived from the systolic and diastolic averages
    pub fn avg_pulse_pressure(&self) -> Option<f64> {
        Some(self.avg_systolic? - self.avg_diastolic?)
    }
}

#[derive(Debug, Default)]
struct MinMax {
    min: Option<i32>,
    max: Option<i32>,
}

impl MinMax {
    fn push(&mut self, value: i32) {
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
    }
}
