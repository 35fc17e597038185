//! Rule-based scene traversal
//!
//! Unlike [`flatten`](crate::flatten), which yields leaves only, a
//! [`GraphTraversal`] visits every node exactly once. The first
//! [`TraversalRule`] whose conditions all hold decides how to descend from
//! a node; a node matching no rule is visited but not descended.

use crate::node::{is_displayable, SceneNode};
use std::fmt;

/// Predicate over a node
pub type NodePredicate = Box<dyn Fn(&SceneNode) -> bool + Send + Sync>;

/// Which members of a node to descend into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAccess {
    /// Descend into `elements`
    Elements,
    /// Do not descend
    Stop,
}

/// A condition set paired with a child accessor
pub struct TraversalRule {
    name: &'static str,
    conditions: Vec<NodePredicate>,
    access: ChildAccess,
}

impl fmt::Debug for TraversalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalRule")
            .field("name", &self.name)
            .field("conditions", &self.conditions.len())
            .field("access", &self.access)
            .finish()
    }
}

impl TraversalRule {
    /// Rule with no conditions (matches everything) that does not descend
    #[inline]
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            conditions: Vec::new(),
            access: ChildAccess::Stop,
        }
    }

    /// Add a condition; all conditions must hold for the rule to match
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(&SceneNode) -> bool + Send + Sync + 'static) -> Self {
        self.conditions.push(Box::new(predicate));
        self
    }

    /// Set the child accessor
    #[inline]
    #[must_use]
    pub fn descend(mut self, access: ChildAccess) -> Self {
        self.access = access;
        self
    }

    /// Rule name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Child accessor applied when this rule matches
    #[inline]
    #[must_use]
    pub fn access(&self) -> ChildAccess {
        self.access
    }

    /// Whether every condition holds for `node`
    #[must_use]
    pub fn matches(&self, node: &SceneNode) -> bool {
        self.conditions.iter().all(|condition| condition(node))
    }
}

/// A node reached by [`GraphTraversal::traverse`]
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext<'a> {
    /// The visited node
    pub node: &'a SceneNode,
    /// Type tag of the node it was reached from
    pub parent_type: Option<&'a str>,
    /// Distance from the root
    pub depth: usize,
}

/// Position of a node handed to [`GraphTraversal::traverse_mut`] visitors
#[derive(Debug, Clone, Copy)]
pub struct VisitContext<'p> {
    /// Type tag of the node it was reached from
    pub parent_type: Option<&'p str>,
    /// Distance from the root
    pub depth: usize,
}

/// Ordered rule set driving a traversal
#[derive(Debug, Default)]
pub struct GraphTraversal {
    rules: Vec<TraversalRule>,
}

impl GraphTraversal {
    /// Create a traversal from rules in priority order
    #[inline]
    #[must_use]
    pub fn new(rules: Vec<TraversalRule>) -> Self {
        Self { rules }
    }

    /// First rule matching `node`
    #[must_use]
    pub fn rule_for(&self, node: &SceneNode) -> Option<&TraversalRule> {
        self.rules.iter().find(|rule| rule.matches(node))
    }

    fn access_for(&self, node: &SceneNode) -> ChildAccess {
        self.rule_for(node).map_or(ChildAccess::Stop, TraversalRule::access)
    }

    /// Visit every reachable node, depth-first in document order
    #[must_use]
    pub fn traverse<'a>(&self, root: &'a SceneNode) -> Vec<TraversalContext<'a>> {
        let mut visited = Vec::new();
        let mut stack = vec![TraversalContext {
            node: root,
            parent_type: None,
            depth: 0,
        }];
        while let Some(context) = stack.pop() {
            if self.access_for(context.node) == ChildAccess::Elements {
                let parent_type = Some(context.node.type_tag.as_str());
                stack.extend(context.node.elements.iter().rev().map(|child| TraversalContext {
                    node: child,
                    parent_type,
                    depth: context.depth + 1,
                }));
            }
            visited.push(context);
        }
        visited
    }

    /// Visit every reachable node with mutable access
    ///
    /// The descent decision for a node is taken before its visitor runs.
    /// Visitors may change node attributes but are expected to leave
    /// `elements` alone.
    pub fn traverse_mut<F>(&self, root: &mut SceneNode, mut visit: F)
    where
        F: FnMut(&mut SceneNode, VisitContext<'_>),
    {
        self.walk_mut(root, None, 0, &mut visit);
    }

    fn walk_mut<F>(&self, node: &mut SceneNode, parent_type: Option<&str>, depth: usize, visit: &mut F)
    where
        F: FnMut(&mut SceneNode, VisitContext<'_>),
    {
        let access = self.access_for(node);
        visit(&mut *node, VisitContext { parent_type, depth });
        if access == ChildAccess::Elements {
            let type_tag = node.type_tag.clone();
            for child in &mut node.elements {
                self.walk_mut(child, Some(&type_tag), depth + 1, visit);
            }
        }
    }
}

/// Rule set used when writing results back onto a scene
///
/// Geometry-bearing leaves stop the descent; containers are entered.
#[must_use]
pub fn rewrite_traversal() -> GraphTraversal {
    GraphTraversal::new(vec![
        TraversalRule::new("geometry-leaf")
            .when(|node| is_displayable(node))
            .when(|node| !node.has_elements())
            .descend(ChildAccess::Stop),
        TraversalRule::new("container")
            .when(SceneNode::has_elements)
            .descend(ChildAccess::Elements),
    ])
}
