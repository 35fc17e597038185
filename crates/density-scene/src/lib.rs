//! Density Scene Model
//!
//! Scene-graph representation and traversal for mesh density analysis.
//!
//! # Core Concepts
//!
//! - [`SceneNode`]: Tree unit; a container (has `elements`) or a leaf with
//!   display [`Representation`]s
//! - [`DisplayValueSource`]: Capability interface resolved once at wrap time
//! - [`flatten`]: Lazy leaf iterator tagging each leaf with its container type
//! - [`GraphTraversal`]: Rule-based visit-every-node traversal used for rewrites
//! - [`EstimateBytes`]: Deterministic payload-size proxy
//!
//! # Example
//!
//! ```rust,ignore
//! use density_scene::{displayable_nodes, SceneNode};
//!
//! let root = SceneNode::from_json_str(&text)?;
//! for leaf in displayable_nodes(&root) {
//!     println!("{:?} under {:?}", leaf.node.id, leaf.parent_type);
//! }
//! ```

#![warn(unreachable_pub)]

mod error;
mod flatten;
mod geometry;
mod id;
mod material;
mod node;
mod size;
mod traversal;
mod wire;

pub use error::SceneError;
pub use flatten::{displayable_nodes, flatten, flatten_with_parent, Flatten, FlattenedNode};
pub use geometry::{BoundingBox, Interval, Mesh};
pub use id::{NodeId, RepresentationId};
pub use material::{pack_argb, RenderMaterial, MATERIAL_TYPE, NO_EMISSION};
pub use node::{
    is_displayable, resolve, DensityStamp, DisplayAlias, DisplayValue, DisplayValueSource, Geometry,
    Representation, SceneNode, DEFAULT_TYPE, MESH_TYPE,
};
pub use size::{EstimateBytes, PACKED_COLOR_BYTES, REPRESENTATION_HEADER_BYTES};
pub use traversal::{
    rewrite_traversal, ChildAccess, GraphTraversal, NodePredicate, TraversalContext, TraversalRule,
    VisitContext,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
