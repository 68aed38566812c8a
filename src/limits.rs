//! Traversal limits - the safety bound on untrusted documents

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Bounds applied while parsing and walking a design tree.
///
/// `max_depth` counts child levels below the root (the root is depth 0).
/// Raw JSON is checked against `max_depth` before it is parsed, so a deep
/// document trips the named depth error at any nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalLimits {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

fn default_max_depth() -> usize { 48 }
fn default_max_nodes() -> usize { 100_000 }

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
        }
    }
}

impl TraversalLimits {
    pub fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self { max_depth, max_nodes }
    }

    /// Load limits from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    pub fn with_max_nodes(self, max_nodes: usize) -> Self {
        Self { max_nodes, ..self }
    }
}
