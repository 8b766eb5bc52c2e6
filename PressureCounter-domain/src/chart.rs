//! Trend chart series
//!
//! Points are laid out by index in chronological order; the axis bounds
//! follow the data with a margin of 10 mmHg (or bpm) but never leave the
//! fixed range of the metric. `lower <= upper` always holds.

use serde::Serialize;

use pressure_counter_data::Measurement;

const AXIS_MARGIN: i32 = 10;

/// Value plotted by a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartMetric {
    Systolic,
    Diastolic,
    Pulse,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 3] = [ChartMetric::Systolic, ChartMetric::Diastolic, ChartMetric::Pulse];

    pub fn value(self, measurement: &Measurement) -> i32 {
        match self {
            ChartMetric::Systolic => measurement.systolic,
            ChartMetric::Diastolic => measurement.diastolic,
            ChartMetric::Pulse => measurement.pulse,
        }
    }

    /// Fixed (floor, ceiling) of the axis
    pub fn axis_limits(self) -> (i32, i32) {
        match self {
            ChartMetric::Systolic => (80, 180),
            ChartMetric::Diastolic => (50, 120),
            ChartMetric::Pulse => (50, 120),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartMetric::Systolic => "Systolic",
            ChartMetric::Diastolic => "Diastolic",
            ChartMetric::Pulse => "Pulse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub index: usize,
    pub value: i32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub metric: ChartMetric,
    pub points: Vec<ChartPoint>,
    pub lower: i32,
    pub upper: i32,
}

impl ChartSeries {
    /// Build the series for `metric`; `None` when there is nothing to plot
    pub fn build(measurements: &[Measurement], metric: ChartMetric) -> Option<Self> {
        let mut sorted: Vec<&Measurement> = measurements.iter().collect();
        sorted.sort_by_key(|m| (m.timestamp, m.id));

        let points: Vec<ChartPoint> = sorted
            .iter()
            .enumerate()
            .map(|(index, m)| ChartPoint {
                index,
                value: metric.value(m),
                timestamp: m.timestamp,
            })
            .collect();

        let min = points.iter().map(|p| p.value).min()?;
        let max = points.iter().map(|p| p.value).max()?;
        let (floor, ceiling) = metric.axis_limits();
        let upper = max.saturating_add(AXIS_MARGIN).min(ceiling);
        // Values entirely outside the fixed range collapse the axis instead of inverting it
        let lower = min.saturating_sub(AXIS_MARGIN).max(floor).min(upper);

        Some(Self {
            metric,
            points,
            lower,
            upper,
        })
    }
}
