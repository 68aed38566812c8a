//! Extraction Pipeline - Single Entry Point
//!
//! Runs both components over one design file and packages the results for
//! the code synthesis consumer. Any failure aborts the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{DesignFile, DesignNode};
use crate::error::{ExtractError, Result};
use crate::hashing::compute_source_hash;
use crate::images::{collect_image_refs_at, ImageRef};
use crate::limits::TraversalLimits;
use crate::normalize::{normalize_at, NormalizedComponent};
use crate::source::DocumentSource;
use crate::tokens::{extract_tokens_at, DesignTokens};
use crate::walk::NodeLocator;
use crate::ENGINE_VERSION;

/// Target framework hint passed through to code synthesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    React,
    Vue,
    Svelte,
    Html,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "react" => Ok(Self::React),
            "vue" => Ok(Self::Vue),
            "svelte" => Ok(Self::Svelte),
            "html" => Ok(Self::Html),
            other => Err(format!("unsupported framework: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Restrict extraction to the subtree rooted at this node id.
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub framework: Framework,
    #[serde(default = "default_true")]
    pub include_images: bool,
}

fn default_true() -> bool { true }

impl Default for ExtractRequest {
    fn default() -> Self {
        Self {
            node_id: None,
            framework: Framework::default(),
            include_images: true,
        }
    }
}

/// Normalized roots handed to code synthesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeStructure {
    pub components: Vec<NormalizedComponent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignBundle {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub framework: Framework,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub source_hash: String,
    pub design_tokens: DesignTokens,
    pub structure: CodeStructure,
    pub images: Vec<ImageRef>,
}

pub struct ExtractionPipeline {
    limits: TraversalLimits,
}

impl ExtractionPipeline {
    pub fn new(limits: TraversalLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &TraversalLimits {
        &self.limits
    }

    /// Load a design file through the given source, under this pipeline's limits.
    pub fn load(&self, source: &dyn DocumentSource) -> Result<DesignFile> {
        debug!(source = %source.describe(), "loading design document");
        source.load(&self.limits)
    }

    /// Run extraction and normalization over one file.
    pub fn run(&self, file: &DesignFile, request: &ExtractRequest) -> Result<DesignBundle> {
        let (root, origin) = self.select_root(file, request.node_id.as_deref())?;

        let design_tokens = extract_tokens_at(root, origin.clone(), &self.limits)?;
        let component = normalize_at(root, origin.clone(), &self.limits)?;
        let images = if request.include_images {
            collect_image_refs_at(root, origin, &self.limits)?
        } else {
            vec![]
        };
        let source_hash = compute_source_hash(root)?;

        info!(
            framework = %request.framework,
            nodes = component.node_count(),
            tokens = design_tokens.len(),
            images = images.len(),
            "design bundle ready"
        );

        Ok(DesignBundle {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            framework: request.framework,
            node_id: request.node_id.clone(),
            source_hash,
            design_tokens,
            structure: CodeStructure {
                components: vec![component],
            },
            images,
        })
    }

    fn select_root<'f>(
        &self,
        file: &'f DesignFile,
        node_id: Option<&str>,
    ) -> Result<(&'f DesignNode, NodeLocator)> {
        match node_id {
            None => Ok((
                &file.document,
                NodeLocator::document(file.document.name.as_deref()),
            )),
            Some(id) => {
                let node = file
                    .document
                    .find(id)
                    .ok_or_else(|| ExtractError::NodeNotFound(id.to_string()))?;
                Ok((node, NodeLocator::subtree(id, node.name.as_deref())))
            }
        }
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(TraversalLimits::default())
    }
}
