//! Shared node walking
//!
//! Pre-order, depth-first, children in declaration order. Token keys are
//! numbered in this order, so every component walks the same way.

use std::fmt;

use crate::document::DesignNode;
use crate::error::{ExtractError, Result};
use crate::limits::TraversalLimits;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Document,
    Node(String),
}

/// Identifies a node in error messages: the index path from the walk's
/// root plus the node's own name when it has one.
///
/// Renders as `document.children[0].children[2] ("Label")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocator {
    origin: Origin,
    indices: Vec<usize>,
    name: Option<String>,
}

impl NodeLocator {
    /// Locator for the `document` root of a design file.
    pub fn document(name: Option<&str>) -> Self {
        Self {
            origin: Origin::Document,
            indices: vec![],
            name: name.map(str::to_string),
        }
    }

    /// Locator for a subtree selected by node id.
    pub fn subtree(id: &str, name: Option<&str>) -> Self {
        Self {
            origin: Origin::Node(id.to_string()),
            indices: vec![],
            name: name.map(str::to_string),
        }
    }

    pub fn child(&self, index: usize, name: Option<&str>) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self {
            origin: self.origin.clone(),
            indices,
            name: name.map(str::to_string),
        }
    }

    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for NodeLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::Document => write!(f, "document")?,
            Origin::Node(id) => write!(f, "node[{id}]")?,
        }
        for index in &self.indices {
            write!(f, ".children[{index}]")?;
        }
        if let Some(name) = &self.name {
            write!(f, " ({name:?})")?;
        }
        Ok(())
    }
}

/// Counts visited nodes and rejects anything past the configured bounds.
pub(crate) struct TraversalGuard<'a> {
    limits: &'a TraversalLimits,
    visited: usize,
}

impl<'a> TraversalGuard<'a> {
    pub(crate) fn new(limits: &'a TraversalLimits) -> Self {
        Self { limits, visited: 0 }
    }

    /// Must be called once per node, before its children.
    pub(crate) fn enter(&mut self, locator: &NodeLocator) -> Result<()> {
        if locator.depth() > self.limits.max_depth {
            return Err(ExtractError::DepthLimitExceeded {
                locator: locator.clone(),
                depth: locator.depth(),
                limit: self.limits.max_depth,
            });
        }
        self.visited += 1;
        if self.visited > self.limits.max_nodes {
            return Err(ExtractError::NodeLimitExceeded {
                locator: locator.clone(),
                limit: self.limits.max_nodes,
            });
        }
        Ok(())
    }

    pub(crate) fn visited(&self) -> usize {
        self.visited
    }
}

/// Fold `visit` over every node in pre-order, threading the accumulator
/// through each call. Uses an explicit stack, so document depth never
/// becomes call-stack depth.
pub fn walk_preorder<'n, A, F>(
    root: &'n DesignNode,
    origin: NodeLocator,
    limits: &TraversalLimits,
    init: A,
    mut visit: F,
) -> Result<A>
where
    F: FnMut(A, &'n DesignNode, &NodeLocator) -> Result<A>,
{
    let mut guard = TraversalGuard::new(limits);
    let mut stack = vec![(root, origin)];
    let mut acc = init;

    while let Some((node, locator)) = stack.pop() {
        guard.enter(&locator)?;
        acc = visit(acc, node, &locator)?;
        for (index, child) in node.children.iter().enumerate().rev() {
            stack.push((child, locator.child(index, child.name.as_deref())));
        }
    }

    tracing::trace!(nodes = guard.visited(), "walk complete");
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, children: Vec<DesignNode>) -> DesignNode {
        DesignNode {
            name: Some(name.to_string()),
            children,
            ..Default::default()
        }
    }

    #[test]
    fn test_locator_display() {
        let root = NodeLocator::document(Some("Root"));
        assert_eq!(root.to_string(), r#"document ("Root")"#);

        let leaf = root.child(0, None).child(2, Some("Label"));
        assert_eq!(leaf.to_string(), r#"document.children[0].children[2] ("Label")"#);
        assert_eq!(leaf.depth(), 2);

        let sub = NodeLocator::subtree("1:2", None).child(1, None);
        assert_eq!(sub.to_string(), "node[1:2].children[1]");
    }

    #[test]
    fn test_walk_is_preorder() {
        let tree = named(
            "a",
            vec![named("b", vec![named("c", vec![])]), named("d", vec![])],
        );

        let order = walk_preorder(
            &tree,
            NodeLocator::document(Some("a")),
            &TraversalLimits::default(),
            Vec::new(),
            |mut seen, node, _| {
                seen.push(node.name.clone().unwrap_or_default());
                Ok(seen)
            },
        )
        .unwrap();

        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_walk_stops_at_depth_limit() {
        let tree = named("a", vec![named("b", vec![named("c", vec![])])]);
        let limits = TraversalLimits::new(1, 100);

        let err = walk_preorder(&tree, NodeLocator::document(Some("a")), &limits, (), |_, _, _| Ok(()))
            .unwrap_err();

        match err {
            ExtractError::DepthLimitExceeded { locator, depth, limit } => {
                assert_eq!(locator.indices(), &[0, 0]);
                assert_eq!(depth, 2);
                assert_eq!(limit, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_walk_stops_at_node_limit() {
        let tree = named("a", vec![named("b", vec![]), named("c", vec![])]);
        let limits = TraversalLimits::new(8, 2);

        let err = walk_preorder(&tree, NodeLocator::document(Some("a")), &limits, (), |_, _, _| Ok(()))
            .unwrap_err();

        assert!(matches!(err, ExtractError::NodeLimitExceeded { limit: 2, .. }));
    }
}
