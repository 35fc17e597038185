//! Geometric primitives carried by display representations
//!
//! Provides [`Interval`], [`BoundingBox`] and [`Mesh`]. Coordinates are in
//! the model's native units; unit conversion happens in the metrics layer.

use serde::{Deserialize, Serialize};

/// Closed numeric interval along one axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    /// Lower bound
    pub start: f64,
    /// Upper bound
    pub end: f64,
}

impl Interval {
    /// Zero-length interval at the origin
    pub const ZERO: Self = Self {
        start: 0.0,
        end: 0.0,
    };

    /// Create a new interval
    #[inline]
    #[must_use]
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Smallest interval enclosing all values
    ///
    /// Returns `None` for an empty sequence, which has no defined bounds.
    #[must_use]
    pub fn enclosing(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), value| (lo.min(value), hi.max(value)));
        Some(Self::new(min, max))
    }

    /// Absolute length of the interval
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).abs()
    }
}

/// Precomputed bounding box attached to a representation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoundingBox {
    /// Enclosed volume
    pub volume: f64,
    /// Footprint area
    pub area: f64,
    /// Extent along the third axis, when known
    pub z_size: Option<Interval>,
}

impl BoundingBox {
    /// Create a box from precomputed volume and area
    #[inline]
    #[must_use]
    pub fn new(volume: f64, area: f64) -> Self {
        Self {
            volume,
            area,
            z_size: None,
        }
    }

    /// With z extent
    #[inline]
    #[must_use]
    pub fn with_z_size(mut self, z_size: Interval) -> Self {
        self.z_size = Some(z_size);
        self
    }

    /// Whether the box has zero extent along the third axis
    #[inline]
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.z_size.is_some_and(|z| z.length() == 0.0)
    }
}

/// Triangle/polygon mesh with a flat `x, y, z` vertex buffer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Flat coordinate buffer, three values per vertex
    pub vertices: Vec<f64>,
    /// Face index buffer
    pub faces: Vec<i64>,
    /// Packed per-vertex colours
    pub colors: Vec<i64>,
}

impl Mesh {
    /// Create a mesh from a flat vertex buffer
    #[inline]
    #[must_use]
    pub fn new(vertices: Vec<f64>) -> Self {
        Self {
            vertices,
            faces: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Create a mesh from vertex triples
    #[must_use]
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        Self::new(points.iter().flatten().copied().collect())
    }

    /// With face indices
    #[inline]
    #[must_use]
    pub fn with_faces(mut self, faces: Vec<i64>) -> Self {
        self.faces = faces;
        self
    }

    /// Number of complete vertices
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Coordinates along one axis: every third value starting at `offset`
    pub fn axis(&self, offset: usize) -> impl Iterator<Item = f64> + '_ {
        self.vertices.iter().skip(offset).step_by(3).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_enclosing_values() {
        let interval = Interval::enclosing([3.0, -1.0, 7.5, 2.0]).unwrap();
        assert_eq!(interval, Interval::new(-1.0, 7.5));
        assert_eq!(interval.length(), 8.5);
    }

    #[test]
    fn interval_enclosing_empty_is_none() {
        assert!(Interval::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn interval_length_is_absolute() {
        assert_eq!(Interval::new(5.0, 2.0).length(), 3.0);
    }

    #[test]
    fn mesh_axis_strides() {
        let mesh = Mesh::from_points(&[[0.0, 1.0, 2.0], [10.0, 11.0, 12.0]]);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.axis(0).collect::<Vec<_>>(), vec![0.0, 10.0]);
        assert_eq!(mesh.axis(1).collect::<Vec<_>>(), vec![1.0, 11.0]);
        assert_eq!(mesh.axis(2).collect::<Vec<_>>(), vec![2.0, 12.0]);
    }

    #[test]
    fn bounding_box_flatness() {
        assert!(!BoundingBox::new(1.0, 1.0).is_flat());
        assert!(BoundingBox::new(0.0, 1.0)
            .with_z_size(Interval::new(4.0, 4.0))
            .is_flat());
    }

    #[test]
    fn bounding_box_deserializes_camel_case() {
        let bbox: BoundingBox = serde_json::from_value(serde_json::json!({
            "volume": 2.0,
            "area": 4.0,
            "zSize": {"start": 0.0, "end": 0.0},
            "basePlane": {}
        }))
        .unwrap();
        assert_eq!(bbox.volume, 2.0);
        assert!(bbox.is_flat());
    }
}
