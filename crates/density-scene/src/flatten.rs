//! Leaf flattening of the scene tree
//!
//! [`flatten`] walks the tree depth-first and yields only leaves, each
//! paired with the type tag of its nearest container. The tree itself is
//! never written during this walk.

use crate::node::{is_displayable, SceneNode};

/// A leaf yielded by [`flatten`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenedNode<'a> {
    /// The leaf node
    pub node: &'a SceneNode,
    /// Type tag of the nearest container, `None` for the root
    pub parent_type: Option<&'a str>,
}

/// Lazy depth-first leaf iterator
///
/// A fresh iterator must be created to walk the tree again.
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    stack: Vec<FlattenedNode<'a>>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = FlattenedNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.stack.pop() {
            if !entry.node.has_elements() {
                return Some(entry);
            }
            let parent_type = Some(entry.node.type_tag.as_str());
            // Reversed so children come out in document order
            self.stack.extend(
                entry
                    .node
                    .elements
                    .iter()
                    .rev()
                    .map(|child| FlattenedNode { node: child, parent_type }),
            );
        }
        None
    }
}

/// Flatten a tree into its leaves
#[inline]
#[must_use]
pub fn flatten(root: &SceneNode) -> Flatten<'_> {
    flatten_with_parent(root, None)
}

/// Flatten a subtree whose root already has a known container type
#[must_use]
pub fn flatten_with_parent<'a>(root: &'a SceneNode, parent_type: Option<&'a str>) -> Flatten<'a> {
    Flatten {
        stack: vec![FlattenedNode {
            node: root,
            parent_type,
        }],
    }
}

/// Leaves worth analyzing: they have an id and renderable representations
pub fn displayable_nodes(root: &SceneNode) -> impl Iterator<Item = FlattenedNode<'_>> {
    flatten(root).filter(|entry| entry.node.id.is_some() && is_displayable(entry.node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::node::Representation;

    fn mesh_leaf(id: &str) -> SceneNode {
        SceneNode::new("Objects.BuiltElements.Wall")
            .with_id(id)
            .with_display(vec![Representation::mesh(format!("{id}-mesh"), Mesh::new(vec![0.0; 3]))])
    }

    fn ids<'a>(iter: impl Iterator<Item = FlattenedNode<'a>>) -> Vec<&'a str> {
        iter.map(|entry| entry.node.id.as_ref().map_or("-", |id| id.as_str()))
            .collect()
    }

    #[test]
    fn single_leaf_flattens_to_itself() {
        let leaf = mesh_leaf("a");
        let flattened: Vec<_> = flatten(&leaf).collect();
        assert_eq!(flattened.len(), 1);
        assert!(std::ptr::eq(flattened[0].node, &leaf));
        assert_eq!(flattened[0].parent_type, None);
    }

    #[test]
    fn containers_are_not_yielded() {
        let tree = SceneNode::new("Collection")
            .with_id("root")
            .with_elements(vec![mesh_leaf("a"), mesh_leaf("b")]);
        let flattened: Vec<_> = flatten(&tree).collect();
        assert_eq!(ids(flattened.iter().copied()), vec!["a", "b"]);
        assert!(flattened.iter().all(|entry| entry.parent_type == Some("Collection")));
    }

    #[test]
    fn nested_containers_tag_nearest_parent() {
        let tree = SceneNode::new("Model").with_elements(vec![
            SceneNode::new("Level").with_elements(vec![mesh_leaf("a")]),
            mesh_leaf("b"),
        ]);
        let flattened: Vec<_> = flatten(&tree).collect();
        assert_eq!(ids(flattened.iter().copied()), vec!["a", "b"]);
        assert_eq!(flattened[0].parent_type, Some("Level"));
        assert_eq!(flattened[1].parent_type, Some("Model"));
    }

    #[test]
    fn empty_container_is_a_leaf_but_not_displayable() {
        let tree = SceneNode::new("Collection")
            .with_elements(vec![SceneNode::new("Collection").with_id("empty"), mesh_leaf("a")]);
        assert_eq!(flatten(&tree).count(), 2);
        assert_eq!(ids(displayable_nodes(&tree)), vec!["a"]);
    }

    #[test]
    fn nodes_without_id_are_not_displayable() {
        let anonymous = SceneNode::new("Wall")
            .with_display(vec![Representation::mesh("m", Mesh::new(vec![0.0; 3]))]);
        let tree = SceneNode::new("Collection").with_elements(vec![anonymous, mesh_leaf("a")]);
        assert_eq!(ids(displayable_nodes(&tree)), vec!["a"]);
    }

    #[test]
    fn iterator_is_restartable_by_reinvoking() {
        let tree = SceneNode::new("Collection").with_elements(vec![mesh_leaf("a"), mesh_leaf("b")]);
        let mut first = flatten(&tree);
        assert!(first.next().is_some());
        assert_eq!(flatten(&tree).count(), 2);
    }

    #[test]
    fn flatten_with_parent_seeds_root_tag() {
        let leaf = mesh_leaf("a");
        let entry = flatten_with_parent(&leaf, Some("Host")).next().unwrap();
        assert_eq!(entry.parent_type, Some("Host"));
    }
}
