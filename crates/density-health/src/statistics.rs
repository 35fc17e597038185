//! Descriptive statistics over aggregate densities
//!
//! Quartiles use the exclusive interpolation method: positions are placed
//! on `n + 1` and clamped to the sample range. A single sample yields
//! both quartiles equal to that sample.

use crate::error::StatsError;
use crate::record::HealthRecord;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// Unrounded statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityStatistics {
    /// Number of samples
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Largest sample
    pub max: f64,
    /// Smallest sample
    pub min: f64,
    /// Sample standard deviation, 0 for fewer than two samples
    pub std_dev: f64,
    /// 25th percentile
    pub first_quartile: f64,
    /// 75th percentile
    pub third_quartile: f64,
}

/// Value cell of a report row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryValue {
    /// Integral count
    Count(usize),
    /// Rounded measurement
    Number(f64),
}

impl Display for SummaryValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

/// Display row: metric label and rounded value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Row label
    pub metric: &'static str,
    /// Row value
    pub value: SummaryValue,
}

/// Full summarizer output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensitySummary {
    /// Unrounded statistics
    pub statistics: DensityStatistics,
    /// Rounded rows for display
    pub rows: Vec<SummaryRow>,
    /// Aggregate density per summarized record
    pub densities: Vec<f64>,
    /// Total bounding volume per summarized record
    pub volume_sums: Vec<f64>,
}

impl DensityStatistics {
    /// Compute statistics over raw samples
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Empty`] when `samples` is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[f64]) -> Result<Self, StatsError> {
        if samples.is_empty() {
            return Err(StatsError::Empty);
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let squares: f64 = sorted.iter().map(|value| (value - mean).powi(2)).sum();
            (squares / (count - 1) as f64).sqrt()
        } else {
            0.0
        };
        let (first_quartile, third_quartile) = quartiles(&sorted);

        Ok(Self {
            count,
            mean,
            median: median(&sorted),
            max: sorted[count - 1],
            min: sorted[0],
            std_dev,
            first_quartile,
            third_quartile,
        })
    }

    /// Labelled rows rounded to 3 decimals
    #[must_use]
    pub fn rows(&self) -> Vec<SummaryRow> {
        let number = |metric, value| SummaryRow {
            metric,
            value: SummaryValue::Number(round3(value)),
        };
        vec![
            SummaryRow {
                metric: "Count",
                value: SummaryValue::Count(self.count),
            },
            number("Average Density", self.mean),
            number("Median Density", self.median),
            number("Max Density", self.max),
            number("Min Density", self.min),
            number("Standard Deviation", self.std_dev),
            number("First Quartile", self.first_quartile),
            number("Third Quartile", self.third_quartile),
        ]
    }
}

/// Summarize the aggregate densities of `records`
///
/// Records are kept when any area is non-negative.
///
/// # Errors
///
/// Returns [`StatsError::Empty`] when no record remains.
pub fn summarize<'a>(
    records: impl IntoIterator<Item = &'a HealthRecord>,
) -> Result<DensitySummary, StatsError> {
    let (densities, volume_sums): (Vec<f64>, Vec<f64>) = records
        .into_iter()
        .filter(|record| record.areas.values().any(|&area| area >= 0.0))
        .map(|record| (record.aggregate_density(), record.total_volume()))
        .unzip();

    let statistics = DensityStatistics::from_samples(&densities)?;
    debug!(count = statistics.count, mean = statistics.mean, "densities summarized");

    Ok(DensitySummary {
        rows: statistics.rows(),
        statistics,
        densities,
        volume_sums,
    })
}

/// Round to 3 decimal places
#[inline]
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn quartiles(sorted: &[f64]) -> (f64, f64) {
    let len = sorted.len();
    if len == 1 {
        return (sorted[0], sorted[0]);
    }
    let m = len + 1;
    let cut = |i: usize| {
        let j = (i * m / 4).clamp(1, len - 1);
        let delta = (i * m) as f64 - (4 * j) as f64;
        (sorted[j - 1] * (4.0 - delta) + sorted[j] * delta) / 4.0
    };
    (cut(1), cut(3))
}
