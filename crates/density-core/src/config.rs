//! Run configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Branch that receives recolored versions
pub const DEFAULT_RECOLOR_BRANCH: &str = "density-check/recolored";

/// Density check configuration
///
/// Every field has a default, so a TOML file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensityCheckConfig {
    /// Density threshold in bytes per m²
    pub density_level: f64,
    /// Largest tolerated share of failing records, 0..=1
    pub max_percentage_high_density_objects: f64,
    /// Reserved branch for recolored output
    pub recolor_branch: String,
    /// Publish the recolored scene at all
    pub publish_recolored: bool,
}

impl DensityCheckConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With density threshold
    #[inline]
    #[must_use]
    pub fn with_density_level(mut self, density_level: f64) -> Self {
        self.density_level = density_level;
        self
    }

    /// With tolerated failing share
    #[inline]
    #[must_use]
    pub fn with_max_percentage(mut self, share: f64) -> Self {
        self.max_percentage_high_density_objects = share;
        self
    }

    /// With recolor branch
    #[inline]
    #[must_use]
    pub fn with_recolor_branch(mut self, branch: impl Into<String>) -> Self {
        self.recolor_branch = branch.into();
        self
    }

    /// With publishing enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_publish_recolored(mut self, publish: bool) -> Self {
        self.publish_recolored = publish;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.density_level.is_finite() || self.density_level < 0.0 {
            return Err(ConfigError::InvalidDensityLevel(self.density_level));
        }
        if !(0.0..=1.0).contains(&self.max_percentage_high_density_objects) {
            return Err(ConfigError::InvalidPercentage(
                self.max_percentage_high_density_objects,
            ));
        }
        if self.recolor_branch.trim().is_empty() {
            return Err(ConfigError::EmptyRecolorBranch);
        }
        Ok(())
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns a parse error or the first invalid field.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// Returns a read, parse or validation error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for DensityCheckConfig {
    fn default() -> Self {
        Self {
            density_level: 100_000.0,
            max_percentage_high_density_objects: 0.1,
            recolor_branch: DEFAULT_RECOLOR_BRANCH.to_string(),
            publish_recolored: true,
        }
    }
}
