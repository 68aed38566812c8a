//! Structure Normalizer
//!
//! Rebuilds the design tree one-for-one into components with explicit
//! name, type, bounds, styles and children. Styles are copied from the
//! node's own fields only; nothing is inherited from ancestors.

use serde::Serialize;
use tracing::debug;

use crate::document::{DesignNode, Paint, Rect, TextStyle};
use crate::error::Result;
use crate::limits::TraversalLimits;
use crate::walk::{NodeLocator, TraversalGuard};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const DEFAULT_TYPE: &str = "FRAME";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedComponent {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub bounds: Rect,
    pub styles: ComponentStyles,
    pub children: Vec<NormalizedComponent>,
}

/// Each key is present only when the source node declared the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentStyles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typography: Option<TextStyle>,
}

impl ComponentStyles {
    pub fn is_empty(&self) -> bool {
        self.background.is_none() && self.border.is_none() && self.typography.is_none()
    }
}

impl NormalizedComponent {
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(component) = stack.pop() {
            count += 1;
            stack.extend(component.children.iter());
        }
        count
    }
}

/// Normalize with the default [`TraversalLimits`].
pub fn normalize(root: &DesignNode) -> Result<NormalizedComponent> {
    normalize_with(root, &TraversalLimits::default())
}

pub fn normalize_with(root: &DesignNode, limits: &TraversalLimits) -> Result<NormalizedComponent> {
    normalize_at(root, NodeLocator::document(root.name.as_deref()), limits)
}

pub(crate) fn normalize_at(
    root: &DesignNode,
    origin: NodeLocator,
    limits: &TraversalLimits,
) -> Result<NormalizedComponent> {
    let mut guard = TraversalGuard::new(limits);
    let component = normalize_node(root, &origin, &mut guard)?;
    debug!(nodes = guard.visited(), "normalized component tree");
    Ok(component)
}

// Recursion depth is bounded by the guard's depth check.
fn normalize_node(
    node: &DesignNode,
    locator: &NodeLocator,
    guard: &mut TraversalGuard<'_>,
) -> Result<NormalizedComponent> {
    guard.enter(locator)?;

    let mut children = Vec::with_capacity(node.children.len());
    for (index, child) in node.children.iter().enumerate() {
        let child_locator = locator.child(index, child.name.as_deref());
        children.push(normalize_node(child, &child_locator, guard)?);
    }

    Ok(NormalizedComponent {
        name: node.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        component_type: node.node_type.clone().unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        bounds: node.absolute_bounding_box.clone().unwrap_or_default(),
        styles: ComponentStyles {
            background: node.fills.clone(),
            border: node.strokes.clone(),
            typography: node.style.clone(),
        },
        children,
    })
}
