//! Density Health
//!
//! Per-node health metrics computed from flattened scene nodes.
//!
//! # Core Concepts
//!
//! - [`HealthRecord`]: Per-representation sizes, volumes and areas for one node
//! - [`create_health_records`]: Builds the record map threaded through a run
//! - [`summarize`]: Descriptive statistics over aggregate densities
//! - [`colorize`]: Viridis gradient colouring against the batch range
//! - [`classify_all`]: Pass/fail classification against a density threshold
//!
//! Everything here is pure computation; sinks and I/O live in `density-core`.

#![warn(unreachable_pub)]

mod error;
mod gradient;
mod metrics;
mod record;
mod statistics;
mod threshold;

pub use error::StatsError;
pub use gradient::{
    colorize, density_material, normalize, viridis, GradientOutput, Rgb8, DEGENERATE_POSITION,
    VIRIDIS,
};
pub use metrics::{
    axis_interval, bounding_metrics, create_health_records, mesh_metrics, BoundingMetrics,
    CUBIC_MM_PER_CUBIC_M, SQUARE_MM_PER_SQUARE_M,
};
pub use record::{Dimension, HealthRecord};
pub use statistics::{round3, summarize, DensityStatistics, DensitySummary, SummaryRow, SummaryValue};
pub use threshold::{
    classify, classify_all, failure_message, float_repr, pass_message, Classification, ThresholdReport, Verdict,
};
