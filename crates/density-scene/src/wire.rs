//! Tolerant conversion between serialized scene objects and [`SceneNode`]s
//!
//! Wrapping never fails below the root: children that are not objects are
//! skipped, a non-array `elements` member counts as "no children", and
//! display entries that are not objects are discarded. Members the model
//! does not understand are kept and written back unchanged.

use crate::error::{json_kind, SceneError};
use crate::geometry::{BoundingBox, Mesh};
use crate::id::{NodeId, RepresentationId};
use crate::material::{RenderMaterial, MATERIAL_TYPE};
use crate::node::{
    DensityStamp, DisplayAlias, DisplayValue, Geometry, Representation, SceneNode, DEFAULT_TYPE,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

const ID_KEY: &str = "id";
const TYPE_KEY: &str = "speckle_type";
const UNITS_KEY: &str = "units";
const ELEMENTS_KEY: &str = "elements";
const VERTICES_KEY: &str = "vertices";
const FACES_KEY: &str = "faces";
const COLORS_KEY: &str = "colors";
const BBOX_KEY: &str = "bbox";
const MATERIAL_KEY: &str = "renderMaterial";
const DENSITY_COMPUTED_KEY: &str = "densityComputed";
const DENSITIES_KEY: &str = "densities";

impl SceneNode {
    /// Wrap a serialized scene object
    ///
    /// # Errors
    /// Returns [`SceneError::NotAnObject`] if the root is not a JSON object.
    pub fn from_json(value: &Value) -> Result<Self, SceneError> {
        match value {
            Value::Object(object) => Ok(node_from_object(object.clone())),
            other => Err(SceneError::NotAnObject {
                found: json_kind(other),
            }),
        }
    }

    /// Parse and wrap a serialized scene
    ///
    /// # Errors
    /// Returns an error if the text is not JSON or the root is not an object.
    pub fn from_json_str(text: &str) -> Result<Self, SceneError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Serialize back into the wire shape
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.extra.clone();
        if let Some(id) = &self.id {
            object.insert(ID_KEY.into(), Value::String(id.to_string()));
        }
        object.insert(TYPE_KEY.into(), Value::String(self.type_tag.clone()));
        if let Some(units) = &self.units {
            object.insert(UNITS_KEY.into(), Value::String(units.clone()));
        }
        if self.has_elements() || self.empty_elements {
            let children = self.elements.iter().map(SceneNode::to_json).collect();
            object.insert(ELEMENTS_KEY.into(), Value::Array(children));
        }
        if let Some(display) = &self.display {
            let items = display.items.iter().map(Representation::to_json).collect();
            object.insert(display.alias.key().into(), Value::Array(items));
        }
        if let Some(stamp) = &self.density {
            object.insert(DENSITY_COMPUTED_KEY.into(), Value::Bool(stamp.computed));
            let densities = stamp
                .densities
                .iter()
                .map(|(id, density)| (id.to_string(), number(*density)))
                .collect();
            object.insert(DENSITIES_KEY.into(), Value::Object(densities));
        }
        Value::Object(object)
    }
}

impl Representation {
    /// Serialize back into the wire shape
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.extra.clone();
        if self.explicit_id {
            object.insert(ID_KEY.into(), Value::String(self.id.to_string()));
        }
        object.insert(TYPE_KEY.into(), Value::String(self.type_tag.clone()));
        if let Geometry::Mesh(mesh) = &self.geometry {
            object.insert(
                VERTICES_KEY.into(),
                Value::Array(mesh.vertices.iter().copied().map(number).collect()),
            );
            object.insert(
                FACES_KEY.into(),
                Value::Array(mesh.faces.iter().map(|&face| Value::from(face)).collect()),
            );
            if !mesh.colors.is_empty() {
                object.insert(
                    COLORS_KEY.into(),
                    Value::Array(mesh.colors.iter().map(|&color| Value::from(color)).collect()),
                );
            }
        }
        if self.render_material != self.source_material {
            match &self.render_material {
                Some(material) => {
                    object.insert(MATERIAL_KEY.into(), material_to_json(material));
                }
                None => {
                    object.remove(MATERIAL_KEY);
                }
            }
        }
        Value::Object(object)
    }
}

fn node_from_object(mut object: Map<String, Value>) -> SceneNode {
    let id = take_string(&mut object, ID_KEY)
        .filter(|id| !id.is_empty())
        .map(NodeId::new);
    let type_tag = take_string(&mut object, TYPE_KEY).unwrap_or_else(|| DEFAULT_TYPE.to_string());
    let units = take_string(&mut object, UNITS_KEY);
    let had_list = matches!(object.get(ELEMENTS_KEY), Some(Value::Array(_)));
    let elements = take_elements(&mut object, id.as_ref());
    let empty_elements = had_list && elements.is_empty();
    let owner = id.as_ref().map_or("anonymous", NodeId::as_str).to_string();
    let display = take_display(&mut object, &owner);
    let density = take_density(&mut object);

    SceneNode {
        id,
        type_tag,
        units,
        elements,
        display,
        density,
        empty_elements,
        extra: object,
    }
}

fn take_elements(object: &mut Map<String, Value>, owner: Option<&NodeId>) -> Vec<SceneNode> {
    match object.get(ELEMENTS_KEY) {
        Some(Value::Array(_)) => {}
        Some(Value::Null) | None => return Vec::new(),
        Some(other) => {
            debug!(
                node = ?owner,
                found = json_kind(other),
                "elements member is not a list, treating node as a leaf"
            );
            return Vec::new();
        }
    }
    let Some(Value::Array(items)) = object.remove(ELEMENTS_KEY) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(child) => Some(node_from_object(child)),
            other => {
                debug!(node = ?owner, found = json_kind(&other), "skipping malformed child");
                None
            }
        })
        .collect()
}

fn take_display(object: &mut Map<String, Value>, owner: &str) -> Option<DisplayValue> {
    let alias = DisplayAlias::ALL.into_iter().find(|alias| {
        matches!(object.get(alias.key()), Some(Value::Array(items)) if !items.is_empty())
    })?;
    let Some(Value::Array(items)) = object.remove(alias.key()) else {
        return None;
    };

    let items = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(entry) => Some(representation_from_object(entry, owner, alias, index)),
            other => {
                debug!(node = owner, index, found = json_kind(&other), "discarding malformed display entry");
                None
            }
        })
        .collect();
    Some(DisplayValue { alias, items })
}

fn representation_from_object(
    mut object: Map<String, Value>,
    owner: &str,
    alias: DisplayAlias,
    index: usize,
) -> Representation {
    let explicit = take_string(&mut object, ID_KEY).filter(|id| !id.is_empty());
    let explicit_id = explicit.is_some();
    let id = explicit.map_or_else(
        || RepresentationId::new(format!("{owner}/{}/{index}", alias.key())),
        RepresentationId::new,
    );
    let type_tag = take_string(&mut object, TYPE_KEY).unwrap_or_else(|| DEFAULT_TYPE.to_string());

    let geometry = match take_numbers(&mut object, VERTICES_KEY) {
        Some(vertices) => Geometry::Mesh(Mesh {
            vertices,
            faces: take_integers(&mut object, FACES_KEY),
            colors: take_integers(&mut object, COLORS_KEY),
        }),
        None => Geometry::Opaque,
    };

    // The raw box stays in `extra` so members the model ignores survive.
    let bbox = object
        .get(BBOX_KEY)
        .filter(|value| value.is_object())
        .and_then(|value| serde_json::from_value::<BoundingBox>(value.clone()).ok());

    // Same for the material: the source object is written back verbatim
    // until a new material is assigned.
    let render_material = match object.get(MATERIAL_KEY) {
        Some(value @ Value::Object(_)) => serde_json::from_value::<RenderMaterial>(value.clone()).ok(),
        _ => None,
    };

    Representation {
        id,
        type_tag,
        geometry,
        bbox,
        source_material: render_material.clone(),
        render_material,
        explicit_id,
        extra: object,
    }
}

fn take_density(object: &mut Map<String, Value>) -> Option<DensityStamp> {
    let computed = object.get(DENSITY_COMPUTED_KEY).and_then(Value::as_bool)?;
    object.remove(DENSITY_COMPUTED_KEY);
    let densities = match object.remove(DENSITIES_KEY) {
        Some(Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(id, value)| value.as_f64().map(|density| (RepresentationId::new(id), density)))
            .collect(),
        Some(other) => {
            object.insert(DENSITIES_KEY.into(), other);
            IndexMap::new()
        }
        None => IndexMap::new(),
    };
    Some(DensityStamp { computed, densities })
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !object.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match object.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

fn take_numbers(object: &mut Map<String, Value>, key: &str) -> Option<Vec<f64>> {
    let values = match object.get(key) {
        Some(Value::Array(items)) => items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    object.remove(key);
    Some(values)
}

fn take_integers(object: &mut Map<String, Value>, key: &str) -> Vec<i64> {
    let values = match object.get(key) {
        Some(Value::Array(items)) => items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>(),
        _ => None,
    };
    match values {
        Some(values) => {
            object.remove(key);
            values
        }
        None => Vec::new(),
    }
}

fn material_to_json(material: &RenderMaterial) -> Value {
    let mut value = serde_json::to_value(material).unwrap_or(Value::Null);
    if let Value::Object(object) = &mut value {
        object.insert(TYPE_KEY.into(), Value::String(MATERIAL_TYPE.into()));
    }
    value
}

/// JSON number for a float; non-finite values become `null`
fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DisplayValueSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn root_must_be_object() {
        let err = SceneNode::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, SceneError::NotAnObject { found: "array" }));
    }

    #[test]
    fn invalid_json_text_is_an_error() {
        assert!(matches!(
            SceneNode::from_json_str("{not json"),
            Err(SceneError::Json(_))
        ));
    }

    #[test]
    fn wraps_nested_tree() {
        let node = SceneNode::from_json(&json!({
            "id": "root",
            "speckle_type": "Speckle.Core.Models.Collection",
            "elements": [
                {"id": "a", "speckle_type": "Wall", "displayValue": [
                    {"id": "m1", "speckle_type": "Objects.Geometry.Mesh", "vertices": [0, 0, 0, 1, 1, 1], "faces": [3, 0, 1, 2]}
                ]},
                42,
                {"id": "b"}
            ]
        }))
        .unwrap();

        assert_eq!(node.id.as_ref().unwrap().as_str(), "root");
        assert_eq!(node.elements.len(), 2);
        let wall = &node.elements[0];
        let reps = crate::resolve(wall).unwrap();
        let mesh = reps[0].as_mesh().unwrap();
        assert_eq!(mesh.vertices, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(mesh.faces, vec![3, 0, 1, 2]);
        assert_eq!(node.elements[1].type_tag, DEFAULT_TYPE);
    }

    #[test]
    fn non_list_elements_treated_as_leaf() {
        let node = SceneNode::from_json(&json!({"id": "x", "elements": {"oops": true}})).unwrap();
        assert!(!node.has_elements());
        // Preserved verbatim for the round trip
        assert_eq!(node.to_json()["elements"], json!({"oops": true}));
    }

    #[test]
    fn primary_alias_wins() {
        let node = SceneNode::from_json(&json!({
            "displayValue": [{"id": "p"}],
            "@displayValue": [{"id": "d"}]
        }))
        .unwrap();
        let display = node.display.as_ref().unwrap();
        assert_eq!(display.alias, DisplayAlias::Primary);
        assert_eq!(display.items[0].id.as_str(), "p");
    }

    #[test]
    fn empty_primary_falls_through_to_alias() {
        let node = SceneNode::from_json(&json!({
            "displayValue": [],
            "@displayValue": [{"id": "d"}]
        }))
        .unwrap();
        let display = node.display.as_ref().unwrap();
        assert_eq!(display.alias, DisplayAlias::Detached);
        assert_eq!(display.items[0].id.as_str(), "d");
    }

    #[test]
    fn malformed_display_entries_are_discarded() {
        let node = SceneNode::from_json(&json!({
            "id": "n",
            "displayValue": ["text", 7, null]
        }))
        .unwrap();
        assert!(crate::resolve(&node).is_none());
    }

    #[test]
    fn non_list_display_value_is_ignored() {
        let node = SceneNode::from_json(&json!({"displayValue": {"id": "single"}})).unwrap();
        assert!(node.display.is_none());
    }

    #[test]
    fn anonymous_representations_get_positional_ids() {
        let node = SceneNode::from_json(&json!({
            "id": "n",
            "displayValue": [{"vertices": [0, 0, 0]}, {"vertices": [1, 1, 1]}]
        }))
        .unwrap();
        let reps = crate::resolve(&node).unwrap();
        assert_eq!(reps[0].id.as_str(), "n/displayValue/0");
        assert_eq!(reps[1].id.as_str(), "n/displayValue/1");
        // Synthetic ids are not written back
        assert!(reps[0].to_json().get("id").is_none());
    }

    #[test]
    fn non_numeric_vertices_are_not_a_mesh() {
        let node = SceneNode::from_json(&json!({
            "displayValue": [{"id": "r", "vertices": ["a", "b", "c"]}]
        }))
        .unwrap();
        let rep = &crate::resolve(&node).unwrap()[0];
        assert!(rep.as_mesh().is_none());
        assert_eq!(rep.extra()["vertices"], json!(["a", "b", "c"]));
    }

    #[test]
    fn bbox_is_parsed_and_preserved() {
        let node = SceneNode::from_json(&json!({
            "displayValue": [{"id": "r", "bbox": {"volume": 3.0, "area": 1.5, "basePlane": {"x": 1}}}]
        }))
        .unwrap();
        let rep = &crate::resolve(&node).unwrap()[0];
        assert_eq!(rep.bounding_box().unwrap().volume, 3.0);
        assert_eq!(rep.to_json()["bbox"]["basePlane"], json!({"x": 1}));
    }

    #[test]
    fn untouched_material_is_written_back_verbatim() {
        let material = json!({"id": "mat-glass", "applicationId": "rvt-77", "name": "Glass", "opacity": 0.3});
        let node = SceneNode::from_json(&json!({
            "displayValue": [{"id": "m", "vertices": [0, 0, 0], "renderMaterial": material}]
        }))
        .unwrap();
        let rep = &crate::resolve(&node).unwrap()[0];
        assert_eq!(rep.render_material.as_ref().unwrap().name, "Glass");
        assert_eq!(rep.to_json()["renderMaterial"], material);
    }

    #[test]
    fn assigned_material_replaces_source_object() {
        let mut node = SceneNode::from_json(&json!({
            "displayValue": [{"id": "m", "renderMaterial": {"id": "mat-glass", "name": "Glass"}}]
        }))
        .unwrap();
        let rep = &mut node.display_value_mut().unwrap()[0];
        rep.render_material = Some(RenderMaterial::with_diffuse("Density #20908c", -14_643_060));

        let json = rep.to_json();
        let written = &json["renderMaterial"];
        assert_eq!(written["name"], "Density #20908c");
        assert_eq!(written["speckle_type"], MATERIAL_TYPE);
        assert!(written.get("id").is_none());

        rep.render_material = None;
        assert!(rep.to_json().get("renderMaterial").is_none());
    }

    #[test]
    fn empty_elements_list_survives() {
        let source = json!({"id": "empty-group", "speckle_type": "Collection", "elements": []});
        let node = SceneNode::from_json(&source).unwrap();
        assert!(!node.has_elements());
        assert_eq!(node.to_json(), source);
        assert!(SceneNode::new("Collection").to_json().get("elements").is_none());
    }

    #[test]
    fn round_trip_preserves_unknown_members_and_stamps() {
        let source = json!({
            "id": "root",
            "speckle_type": "Collection",
            "name": "Level 1",
            "elements": [{
                "id": "leaf",
                "speckle_type": "Wall",
                "densityComputed": true,
                "densities": {"m": 12.5},
                "@displayValue": [{
                    "id": "m",
                    "speckle_type": "Objects.Geometry.Mesh",
                    "vertices": [0.0, 0.0, 0.0],
                    "faces": [],
                    "renderMaterial": {"name": "x", "diffuse": -1, "opacity": 1.0, "metalness": 0.0, "roughness": 1.0, "emissive": -16777216}
                }]
            }]
        });
        let node = SceneNode::from_json(&source).unwrap();
        let stamp = node.elements[0].density.as_ref().unwrap();
        assert!(stamp.computed);
        assert_eq!(stamp.densities["m"], 12.5);

        let again = SceneNode::from_json(&node.to_json()).unwrap();
        assert_eq!(again, node);
        assert_eq!(node.to_json()["name"], json!("Level 1"));
    }
}
