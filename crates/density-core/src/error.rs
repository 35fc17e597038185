//! Error types for the density check pipeline
//!
//! Malformed scene input never reaches this layer: it is recovered where
//! it is parsed. What remains are configuration mistakes, runs with no
//! analyzable input and upstream publish failures.

use density_health::StatsError;
use std::path::PathBuf;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Nothing in the scene can be analyzed
    #[error("No displayable mesh objects found.")]
    NoDisplayableNodes,

    /// Statistics could not be computed
    #[error("statistics failed: {0}")]
    Stats(#[from] StatsError),

    /// The publish sink returned no version
    #[error("publishing to branch {branch:?} failed: {source}")]
    PublishFailed {
        /// Target branch
        branch: String,
        /// Sink failure
        #[source]
        source: PublishError,
    },

    /// Report serialization failed
    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed to load
        path: PathBuf,
        /// Underlying read error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Threshold is negative or not finite
    #[error("density level must be a finite non-negative number, got {0}")]
    InvalidDensityLevel(f64),

    /// Allowed share lies outside 0..=1
    #[error("max percentage of high density objects must lie in 0..=1, got {0}")]
    InvalidPercentage(f64),

    /// Reserved recolor branch is empty
    #[error("recolor branch name must not be empty")]
    EmptyRecolorBranch,
}

/// Publish sink failures
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Sink refused the publish
    #[error("publish rejected: {0}")]
    Rejected(String),

    /// Sink storage failed
    #[error("publish i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
