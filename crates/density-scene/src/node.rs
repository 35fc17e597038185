//! Scene-graph nodes and their display representations
//!
//! A [`SceneNode`] is either a container (non-empty `elements`) or a leaf
//! that may carry renderable [`Representation`]s. Capabilities such as
//! "has display values" or "has a precomputed bounding box" are resolved
//! once when a node is wrapped, then exposed through [`DisplayValueSource`]
//! and [`Representation::bounding_box`].

use crate::geometry::{BoundingBox, Mesh};
use crate::id::{NodeId, RepresentationId};
use crate::material::RenderMaterial;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Type tag used when a serialized object carries none
pub const DEFAULT_TYPE: &str = "Base";

/// Type tag given to meshes built in code
pub const MESH_TYPE: &str = "Objects.Geometry.Mesh";

/// Property names under which display values may be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayAlias {
    /// `displayValue`
    #[default]
    Primary,
    /// `@displayValue` (detached form)
    Detached,
}

impl DisplayAlias {
    /// Aliases in lookup priority order
    pub const ALL: [Self; 2] = [Self::Primary, Self::Detached];

    /// Serialized property name
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Primary => "displayValue",
            Self::Detached => "@displayValue",
        }
    }
}

/// Geometry payload of a representation
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Vertex mesh
    Mesh(Mesh),
    /// Anything without recognised geometry
    Opaque,
}

/// One renderable unit attached to a node
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    /// Representation identity
    pub id: RepresentationId,
    /// Type tag
    pub type_tag: String,
    /// Geometry payload
    pub geometry: Geometry,
    /// Precomputed bounding box, if the source carried one
    pub bbox: Option<BoundingBox>,
    /// Assigned render material
    pub render_material: Option<RenderMaterial>,
    pub(crate) explicit_id: bool,
    /// Material as read; the raw source object stays in `extra` while
    /// `render_material` still equals it
    pub(crate) source_material: Option<RenderMaterial>,
    pub(crate) extra: Map<String, Value>,
}

impl Representation {
    /// Mesh representation
    #[must_use]
    pub fn mesh(id: impl Into<RepresentationId>, mesh: Mesh) -> Self {
        Self {
            id: id.into(),
            type_tag: MESH_TYPE.to_string(),
            geometry: Geometry::Mesh(mesh),
            bbox: None,
            render_material: None,
            explicit_id: true,
            source_material: None,
            extra: Map::new(),
        }
    }

    /// Representation without recognised geometry
    #[must_use]
    pub fn opaque(id: impl Into<RepresentationId>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            geometry: Geometry::Opaque,
            bbox: None,
            render_material: None,
            explicit_id: true,
            source_material: None,
            extra: Map::new(),
        }
    }

    /// With precomputed bounding box
    #[inline]
    #[must_use]
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Mesh payload, if this is a mesh
    #[inline]
    #[must_use]
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.geometry {
            Geometry::Mesh(mesh) => Some(mesh),
            Geometry::Opaque => None,
        }
    }

    /// Precomputed bounding box, if any
    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Unrecognised members preserved from the source
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Display collection of a node, remembering which alias it came from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayValue {
    /// Alias the collection was read from
    pub alias: DisplayAlias,
    /// Representations that survived filtering
    pub items: Vec<Representation>,
}

/// Density annotation stamped onto a node by the rewrite pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DensityStamp {
    /// Whether density was computed for this node
    pub computed: bool,
    /// Per-representation densities
    pub densities: IndexMap<RepresentationId, f64>,
}

/// A unit of the scene tree
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node identity, absent for anonymous nodes
    pub id: Option<NodeId>,
    /// Type tag
    pub type_tag: String,
    /// Model units
    pub units: Option<String>,
    /// Child nodes; empty for leaves
    pub elements: Vec<SceneNode>,
    /// Display representations
    pub display: Option<DisplayValue>,
    /// Density annotation from a previous rewrite
    pub density: Option<DensityStamp>,
    /// Source carried an explicit empty `elements` list
    pub(crate) empty_elements: bool,
    pub(crate) extra: Map<String, Value>,
}

impl SceneNode {
    /// Empty node with a type tag
    #[must_use]
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            id: None,
            type_tag: type_tag.into(),
            units: None,
            elements: Vec::new(),
            display: None,
            density: None,
            empty_elements: false,
            extra: Map::new(),
        }
    }

    /// With identity
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With units
    #[inline]
    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// With children
    #[inline]
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<SceneNode>) -> Self {
        self.elements = elements;
        self
    }

    /// With display representations under the primary alias
    #[inline]
    #[must_use]
    pub fn with_display(self, items: Vec<Representation>) -> Self {
        self.with_display_alias(DisplayAlias::Primary, items)
    }

    /// With display representations under a specific alias
    #[inline]
    #[must_use]
    pub fn with_display_alias(mut self, alias: DisplayAlias, items: Vec<Representation>) -> Self {
        self.display = Some(DisplayValue { alias, items });
        self
    }

    /// Whether the node has children
    #[inline]
    #[must_use]
    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    /// Unrecognised members preserved from the source
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Total number of nodes in this subtree, including `self`
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.elements.iter().map(SceneNode::subtree_len).sum::<usize>()
    }
}

/// Capability: access to a node's display representations
pub trait DisplayValueSource {
    /// Representations, or `None` when the node has no display collection
    fn display_value(&self) -> Option<&[Representation]>;

    /// Mutable access to the representations
    fn display_value_mut(&mut self) -> Option<&mut [Representation]>;
}

impl DisplayValueSource for SceneNode {
    fn display_value(&self) -> Option<&[Representation]> {
        self.display.as_ref().map(|display| display.items.as_slice())
    }

    fn display_value_mut(&mut self) -> Option<&mut [Representation]> {
        self.display.as_mut().map(|display| display.items.as_mut_slice())
    }
}

/// Renderable representations of a node
///
/// Returns `None` when the node has no display collection or when nothing
/// survived filtering of malformed entries.
#[inline]
#[must_use]
pub fn resolve<N: DisplayValueSource + ?Sized>(node: &N) -> Option<&[Representation]> {
    node.display_value().filter(|items| !items.is_empty())
}

/// Whether a node is worth analyzing
#[inline]
#[must_use]
pub fn is_displayable<N: DisplayValueSource + ?Sized>(node: &N) -> bool {
    resolve(node).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_with_mesh() -> SceneNode {
        SceneNode::new("Objects.BuiltElements.Wall")
            .with_id("wall")
            .with_display(vec![Representation::mesh("m1", Mesh::new(vec![0.0; 9]))])
    }

    #[test]
    fn resolve_returns_representations() {
        let node = leaf_with_mesh();
        let reps = resolve(&node).unwrap();
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].id.as_str(), "m1");
        assert!(is_displayable(&node));
    }

    #[test]
    fn resolve_empty_collection_is_none() {
        let node = SceneNode::new(DEFAULT_TYPE).with_display(Vec::new());
        assert!(resolve(&node).is_none());
        assert!(!is_displayable(&node));
    }

    #[test]
    fn resolve_missing_collection_is_none() {
        assert!(resolve(&SceneNode::new(DEFAULT_TYPE)).is_none());
    }

    #[test]
    fn detached_alias_resolves_too() {
        let node = SceneNode::new(DEFAULT_TYPE).with_display_alias(
            DisplayAlias::Detached,
            vec![Representation::opaque("r", "Objects.Geometry.Brep")],
        );
        assert!(is_displayable(&node));
        assert_eq!(node.display.unwrap().alias.key(), "@displayValue");
    }

    #[test]
    fn subtree_len_counts_all_nodes() {
        let tree = SceneNode::new("Collection").with_elements(vec![
            leaf_with_mesh(),
            SceneNode::new("Collection").with_elements(vec![leaf_with_mesh()]),
        ]);
        assert_eq!(tree.subtree_len(), 4);
    }

    #[test]
    fn representation_capabilities() {
        let mesh = Representation::mesh("m", Mesh::default());
        assert!(mesh.as_mesh().is_some());
        assert!(mesh.bounding_box().is_none());

        let boxed = Representation::opaque("b", "Brep").with_bbox(BoundingBox::new(1.0, 2.0));
        assert!(boxed.as_mesh().is_none());
        assert_eq!(boxed.bounding_box().unwrap().area, 2.0);
    }
}
