//! Health record: the computed metrics bundle for one node

use density_scene::{NodeId, RenderMaterial, RepresentationId};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Dimensionality classification of a node's geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Dimension {
    /// Some representation has zero extent along the third axis
    #[serde(rename = "2D")]
    TwoD,
    /// Volumetric geometry
    #[default]
    #[serde(rename = "3D")]
    ThreeD,
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        })
    }
}

/// Metrics for one flattened node
///
/// Maps are keyed by representation id. Densities are derived on demand,
/// never stored, so they always agree with `sizes` and `areas`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    /// Node identity
    pub id: NodeId,
    /// Estimated bytes per representation
    pub sizes: IndexMap<RepresentationId, usize>,
    /// Bounding volume per representation, m³
    pub bounding_volumes: IndexMap<RepresentationId, f64>,
    /// Footprint area per representation, m²
    pub areas: IndexMap<RepresentationId, f64>,
    /// Nearest container's type tag
    pub parent_type: Option<String>,
    /// The node's own type tag
    pub type_tag: Option<String>,
    /// Model units of the source node
    pub units: Option<String>,
    /// Dimensionality
    pub dimension: Dimension,
    /// Material assigned by colorization
    pub material: Option<RenderMaterial>,
}

impl HealthRecord {
    /// Empty record
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            sizes: IndexMap::new(),
            bounding_volumes: IndexMap::new(),
            areas: IndexMap::new(),
            parent_type: None,
            type_tag: None,
            units: None,
            dimension: Dimension::default(),
            material: None,
        }
    }

    /// Per-representation density: size over area, 0 when the area is 0
    ///
    /// Missing area entries count as 0.
    #[must_use]
    pub fn densities(&self) -> IndexMap<RepresentationId, f64> {
        self.sizes
            .iter()
            .map(|(id, &size)| {
                let area = self.areas.get(id).copied().unwrap_or(0.0);
                (id.clone(), ratio(size, area))
            })
            .collect()
    }

    /// Total size over total area, 0 when the total area is 0
    #[must_use]
    pub fn aggregate_density(&self) -> f64 {
        let total_area: f64 = self.areas.values().sum();
        ratio(self.total_size(), total_area)
    }

    /// Sum of representation sizes
    #[inline]
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.sizes.values().sum()
    }

    /// Sum of bounding volumes
    #[inline]
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.bounding_volumes.values().sum()
    }

    /// Number of representations measured
    #[inline]
    #[must_use]
    pub fn representation_count(&self) -> usize {
        self.sizes.len()
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(size: usize, area: f64) -> f64 {
    if area > 0.0 {
        let density = size as f64 / area;
        if density.is_finite() {
            return density;
        }
    }
    0.0
}

impl Display for HealthRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let densities = self.densities();
        write!(f, "HealthRecord(id={}, parent_type={:?}, entries={{", self.id, self.parent_type)?;
        for (index, (key, size)) in self.sizes.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{key}: (dimension={}, size={size}, volume={}, area={}, density={})",
                self.dimension,
                self.bounding_volumes.get(key).copied().unwrap_or(0.0),
                self.areas.get(key).copied().unwrap_or(0.0),
                densities.get(key).copied().unwrap_or(0.0),
            )?;
        }
        f.write_str("})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(&str, usize, f64)]) -> HealthRecord {
        let mut record = HealthRecord::new("n");
        for &(id, size, area) in entries {
            record.sizes.insert(id.into(), size);
            record.areas.insert(id.into(), area);
            record.bounding_volumes.insert(id.into(), 0.0);
        }
        record
    }

    #[test]
    fn densities_per_representation() {
        let record = record(&[("a", 100, 2.0), ("b", 50, 0.0)]);
        let densities = record.densities();
        assert_eq!(densities["a"], 50.0);
        assert_eq!(densities["b"], 0.0);
    }

    #[test]
    fn densities_keys_match_sizes() {
        let record = record(&[("a", 1, 1.0), ("b", 2, 1.0), ("c", 3, 0.0)]);
        let keys: Vec<_> = record.densities().into_keys().collect();
        let sizes: Vec<_> = record.sizes.keys().cloned().collect();
        assert_eq!(keys, sizes);
    }

    #[test]
    fn missing_area_defaults_to_zero() {
        let mut record = HealthRecord::new("n");
        record.sizes.insert("a".into(), 10);
        assert_eq!(record.densities()["a"], 0.0);
        assert_eq!(record.aggregate_density(), 0.0);
    }

    #[test]
    fn aggregate_density_sums_then_divides() {
        let record = record(&[("a", 100, 1.0), ("b", 300, 3.0)]);
        assert_eq!(record.aggregate_density(), 100.0);
    }

    #[test]
    fn empty_record_has_zero_aggregate() {
        assert_eq!(HealthRecord::new("x").aggregate_density(), 0.0);
    }

    #[test]
    fn dimension_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Dimension::TwoD).unwrap(), "\"2D\"");
        assert_eq!(Dimension::default().to_string(), "3D");
    }

    #[test]
    fn display_lists_entries() {
        let text = record(&[("a", 10, 2.0)]).to_string();
        assert!(text.starts_with("HealthRecord(id=n"));
        assert!(text.contains("a: (dimension=3D, size=10, volume=0, area=2, density=5)"));
    }
}
