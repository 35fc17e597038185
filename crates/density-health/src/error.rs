//! Error types for density computation

use thiserror::Error;

/// Statistics failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// No record survived filtering
    #[error("no records to summarize")]
    Empty,
}
