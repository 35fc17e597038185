//! Per-representation metric computation
//!
//! Mesh coordinates are taken to be millimetres. Volumes are reported in
//! cubic metres and footprint areas in square metres, both derived from
//! the axis-aligned bounding box of the vertex buffer.

use crate::record::{Dimension, HealthRecord};
use density_scene::{resolve, EstimateBytes, FlattenedNode, Interval, Mesh, NodeId, Representation};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// mm³ per m³
pub const CUBIC_MM_PER_CUBIC_M: f64 = 1e9;

/// mm² per m²
pub const SQUARE_MM_PER_SQUARE_M: f64 = 1e6;

/// Bounding metrics of one representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingMetrics {
    /// Volume, m³
    pub volume: f64,
    /// Footprint area, m²
    pub area: f64,
    /// Zero extent along the third axis
    pub flat: bool,
}

impl BoundingMetrics {
    /// No geometry
    pub const EMPTY: Self = Self {
        volume: 0.0,
        area: 0.0,
        flat: false,
    };
}

/// Interval over every third coordinate starting at `offset`
///
/// An empty axis yields [`Interval::ZERO`] instead of failing.
#[must_use]
pub fn axis_interval(vertices: &[f64], offset: usize) -> Interval {
    Interval::enclosing(vertices.iter().skip(offset).step_by(3).copied()).unwrap_or(Interval::ZERO)
}

/// Bounding metrics of a mesh from its vertex buffer
#[must_use]
pub fn mesh_metrics(mesh: &Mesh) -> BoundingMetrics {
    if mesh.vertex_count() == 0 {
        warn!(
            coordinates = mesh.vertices.len(),
            "mesh has no complete vertex, using zero-length intervals"
        );
    }
    let x = axis_interval(&mesh.vertices, 0).length();
    let y = axis_interval(&mesh.vertices, 1).length();
    let z = axis_interval(&mesh.vertices, 2).length();

    BoundingMetrics {
        volume: x * y * z / CUBIC_MM_PER_CUBIC_M,
        area: x * y / SQUARE_MM_PER_SQUARE_M,
        flat: z == 0.0,
    }
}

/// Bounding metrics of any representation
///
/// A precomputed bounding box takes precedence over the mesh buffer.
/// Representations with neither measure zero.
#[must_use]
pub fn bounding_metrics(representation: &Representation) -> BoundingMetrics {
    if let Some(bbox) = representation.bounding_box() {
        return BoundingMetrics {
            volume: sanitize(bbox.volume, "volume", representation),
            area: sanitize(bbox.area, "area", representation),
            flat: bbox.is_flat(),
        };
    }
    match representation.as_mesh() {
        Some(mesh) => mesh_metrics(mesh),
        None => {
            debug!(
                representation = %representation.id,
                type_tag = %representation.type_tag,
                "no measurable geometry"
            );
            BoundingMetrics::EMPTY
        }
    }
}

fn sanitize(value: f64, field: &'static str, representation: &Representation) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!(representation = %representation.id, field, value, "invalid bounding box value, using 0");
        0.0
    }
}

impl HealthRecord {
    /// Measure representations into this record
    ///
    /// The dimension becomes 2D as soon as any representation is flat.
    pub fn measure(&mut self, representations: &[Representation]) {
        for representation in representations {
            let metrics = bounding_metrics(representation);
            self.bounding_volumes
                .insert(representation.id.clone(), metrics.volume);
            self.areas.insert(representation.id.clone(), metrics.area);
            if metrics.flat {
                self.dimension = Dimension::TwoD;
            }
        }
        self.sizes.extend(
            representations
                .iter()
                .map(|representation| (representation.id.clone(), representation.estimated_bytes())),
        );
    }

    /// Populate a record from a flattened node
    ///
    /// Returns `None` for anonymous nodes, which cannot be keyed.
    #[must_use]
    pub fn from_flattened(entry: FlattenedNode<'_>) -> Option<Self> {
        let id = entry.node.id.clone()?;
        let mut record = Self::new(id);
        record.absorb(entry);
        Some(record)
    }

    fn absorb(&mut self, entry: FlattenedNode<'_>) {
        self.parent_type = entry.parent_type.map(str::to_string);
        self.type_tag = Some(entry.node.type_tag.clone());
        self.units.clone_from(&entry.node.units);
        if let Some(representations) = resolve(entry.node) {
            self.measure(representations);
        }
    }
}

/// Build the record map from flattened nodes
///
/// Nodes sharing an id accumulate into one record; anonymous nodes are
/// skipped.
pub fn create_health_records<'a>(
    nodes: impl IntoIterator<Item = FlattenedNode<'a>>,
) -> IndexMap<NodeId, HealthRecord> {
    let mut records: IndexMap<NodeId, HealthRecord> = IndexMap::new();
    for entry in nodes {
        let Some(id) = entry.node.id.clone() else {
            continue;
        };
        records
            .entry(id.clone())
            .or_insert_with(|| HealthRecord::new(id))
            .absorb(entry);
    }
    debug!(records = records.len(), "health records created");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use density_scene::{BoundingBox, Interval, SceneNode};

    fn mesh(points: &[[f64; 3]]) -> Mesh {
        Mesh::from_points(points)
    }

    #[test]
    fn axis_interval_samples_strides() {
        let vertices = [0.0, 5.0, 1.0, 10.0, -5.0, 3.0];
        assert_eq!(axis_interval(&vertices, 0), Interval::new(0.0, 10.0));
        assert_eq!(axis_interval(&vertices, 1), Interval::new(-5.0, 5.0));
        assert_eq!(axis_interval(&vertices, 2), Interval::new(1.0, 3.0));
    }

    #[test]
    fn axis_interval_empty_is_zero() {
        assert_eq!(axis_interval(&[], 0), Interval::ZERO);
        assert_eq!(axis_interval(&[1.0], 2), Interval::ZERO);
    }

    #[test]
    fn flat_mesh_metrics() {
        let metrics = mesh_metrics(&mesh(&[[0.0, 0.0, 0.0], [10.0, 20.0, 0.0]]));
        assert_eq!(metrics.area, 200.0 / 1e6);
        assert_eq!(metrics.volume, 0.0);
        assert!(metrics.flat);
    }

    #[test]
    fn cube_mesh_metrics() {
        let metrics = mesh_metrics(&mesh(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]]));
        assert_eq!(metrics.area, 100.0 / 1e6);
        assert_eq!(metrics.volume, 1000.0 / 1e9);
        assert!(!metrics.flat);
    }

    #[test]
    fn empty_mesh_is_guarded() {
        let metrics = mesh_metrics(&Mesh::default());
        assert_eq!(metrics.area, 0.0);
        assert_eq!(metrics.volume, 0.0);
    }

    #[test]
    fn bbox_takes_precedence() {
        let rep = Representation::mesh("m", mesh(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]]))
            .with_bbox(BoundingBox::new(7.0, 3.0));
        let metrics = bounding_metrics(&rep);
        assert_eq!(metrics.volume, 7.0);
        assert_eq!(metrics.area, 3.0);
    }

    #[test]
    fn invalid_bbox_values_become_zero() {
        let rep = Representation::opaque("b", "Brep").with_bbox(BoundingBox::new(f64::NAN, -2.0));
        assert_eq!(bounding_metrics(&rep), BoundingMetrics::EMPTY);
    }

    #[test]
    fn opaque_representation_measures_zero() {
        assert_eq!(
            bounding_metrics(&Representation::opaque("x", "Objects.Geometry.Brep")),
            BoundingMetrics::EMPTY
        );
    }

    #[test]
    fn measure_fills_all_maps_with_same_keys() {
        let mut record = HealthRecord::new("n");
        record.measure(&[
            Representation::mesh("m", mesh(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]])),
            Representation::opaque("o", "Brep"),
        ]);
        let size_keys: Vec<_> = record.sizes.keys().collect();
        assert_eq!(size_keys, record.areas.keys().collect::<Vec<_>>());
        assert_eq!(size_keys, record.bounding_volumes.keys().collect::<Vec<_>>());
    }

    #[test]
    fn any_flat_representation_makes_record_2d() {
        let mut record = HealthRecord::new("n");
        record.measure(&[
            Representation::mesh("flat", mesh(&[[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]])),
            Representation::mesh("solid", mesh(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]])),
        ]);
        assert_eq!(record.dimension, Dimension::TwoD);
    }

    #[test]
    fn flat_bbox_makes_record_2d() {
        let mut record = HealthRecord::new("slab");
        record.measure(&[Representation::opaque("b", "Objects.Geometry.Brep")
            .with_bbox(BoundingBox::new(0.0, 6.0).with_z_size(Interval::new(4.0, 4.0)))]);
        assert_eq!(record.dimension, Dimension::TwoD);
        assert_eq!(record.areas["b"], 6.0);
    }

    #[test]
    fn bbox_with_height_stays_3d() {
        let mut record = HealthRecord::new("column");
        record.measure(&[Representation::opaque("b", "Objects.Geometry.Brep")
            .with_bbox(BoundingBox::new(2.0, 1.0).with_z_size(Interval::new(0.0, 2.0)))]);
        assert_eq!(record.dimension, Dimension::ThreeD);
    }

    #[test]
    fn duplicate_ids_accumulate() {
        let a = SceneNode::new("Wall")
            .with_id("same")
            .with_display(vec![Representation::mesh("m1", Mesh::default())]);
        let b = SceneNode::new("Wall")
            .with_id("same")
            .with_display(vec![Representation::mesh("m2", Mesh::default())]);
        let tree = SceneNode::new("Collection").with_elements(vec![a, b]);
        let records = create_health_records(density_scene::displayable_nodes(&tree));
        assert_eq!(records.len(), 1);
        assert_eq!(records["same"].representation_count(), 2);
    }

    #[test]
    fn from_flattened_copies_node_context() {
        let node = SceneNode::new("Wall")
            .with_id("w")
            .with_units("mm")
            .with_display(vec![Representation::mesh("m", Mesh::default())]);
        let record = HealthRecord::from_flattened(FlattenedNode {
            node: &node,
            parent_type: Some("Level"),
        })
        .unwrap();
        assert_eq!(record.parent_type.as_deref(), Some("Level"));
        assert_eq!(record.type_tag.as_deref(), Some("Wall"));
        assert_eq!(record.units.as_deref(), Some("mm"));
    }
}
