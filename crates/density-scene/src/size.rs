//! Deterministic payload-size estimation
//!
//! Sizes are a proxy for payload weight, summed from structural field
//! widths so the same scene always yields the same numbers.

use crate::geometry::Mesh;
use crate::node::{resolve, Representation, SceneNode};
use std::mem::size_of;

/// Fixed per-representation overhead
pub const REPRESENTATION_HEADER_BYTES: usize = 56;

/// Bytes per packed colour value
pub const PACKED_COLOR_BYTES: usize = size_of::<i32>();

/// Approximate payload size in bytes
pub trait EstimateBytes {
    /// Estimated size of this value's payload
    fn estimated_bytes(&self) -> usize;
}

impl EstimateBytes for Mesh {
    fn estimated_bytes(&self) -> usize {
        self.vertices.len() * size_of::<f64>()
            + self.faces.len() * size_of::<i64>()
            + self.colors.len() * PACKED_COLOR_BYTES
    }
}

impl EstimateBytes for Representation {
    fn estimated_bytes(&self) -> usize {
        REPRESENTATION_HEADER_BYTES
            + self.id.as_str().len()
            + self.type_tag.len()
            + self.as_mesh().map_or(0, EstimateBytes::estimated_bytes)
    }
}

impl EstimateBytes for SceneNode {
    /// Sum over the node's renderable representations, 0 when it has none
    fn estimated_bytes(&self) -> usize {
        resolve(self).map_or(0, |items| items.iter().map(EstimateBytes::estimated_bytes).sum())
    }
}
