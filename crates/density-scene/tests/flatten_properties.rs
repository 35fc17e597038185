use density_scene::{
    displayable_nodes, flatten, rewrite_traversal, Mesh, Representation, SceneNode,
};
use proptest::prelude::*;

fn leaf(id: String) -> SceneNode {
    SceneNode::new("Objects.BuiltElements.Wall")
        .with_id(id.clone())
        .with_display(vec![Representation::mesh(format!("{id}-m"), Mesh::new(vec![0.0; 9]))])
}

proptest! {
    #[test]
    fn prop_leaf_tree_flattens_to_itself(id in "[a-z]{1,8}") {
        let node = leaf(id.clone());
        let flattened: Vec<_> = flatten(&node).collect();
        prop_assert_eq!(flattened.len(), 1);
        prop_assert_eq!(flattened[0].node, &node);
        prop_assert_eq!(flattened[0].parent_type, None);
    }

    #[test]
    fn prop_one_level_containers_yield_exact_leaf_set(
        groups in proptest::collection::vec(1..6usize, 1..6)
    ) {
        let mut expected = Vec::new();
        let containers: Vec<SceneNode> = groups
            .iter()
            .enumerate()
            .map(|(g, &count)| {
                let type_tag = format!("Group{g}");
                let leaves: Vec<SceneNode> = (0..count)
                    .map(|i| {
                        let id = format!("g{g}-l{i}");
                        expected.push((id.clone(), type_tag.clone()));
                        leaf(id)
                    })
                    .collect();
                SceneNode::new(type_tag).with_elements(leaves)
            })
            .collect();

        // Each container is flattened as its own root level
        let mut actual = Vec::new();
        for container in &containers {
            for entry in flatten(container) {
                actual.push((
                    entry.node.id.as_ref().unwrap().to_string(),
                    entry.parent_type.unwrap().to_string(),
                ));
            }
        }
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_flatten_never_yields_containers(depth in 1..5usize, width in 1..4usize) {
        fn build(depth: usize, width: usize, prefix: &str) -> SceneNode {
            if depth == 0 {
                return leaf(prefix.to_string());
            }
            SceneNode::new(format!("Level{depth}")).with_elements(
                (0..width).map(|i| build(depth - 1, width, &format!("{prefix}.{i}"))).collect(),
            )
        }
        let tree = build(depth, width, "n");
        let leaves: Vec<_> = flatten(&tree).collect();
        prop_assert!(leaves.iter().all(|entry| !entry.node.has_elements()));
        prop_assert_eq!(leaves.len(), width.pow(u32::try_from(depth).unwrap()));
        prop_assert_eq!(displayable_nodes(&tree).count(), leaves.len());
        prop_assert_eq!(rewrite_traversal().traverse(&tree).len(), tree.subtree_len());
    }
}

#[test]
fn flattening_reads_without_writing() {
    let tree = SceneNode::new("Collection").with_elements(vec![leaf("a".into()), leaf("b".into())]);
    let before = tree.clone();
    let _ = flatten(&tree).count();
    assert_eq!(tree, before);
}
