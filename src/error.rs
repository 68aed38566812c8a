//! Error taxonomy
//!
//! Every failure aborts the whole call. Nothing here carries a partial tree.

use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::walk::NodeLocator;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed input at {locator}: {reason}")]
    MalformedInput { locator: NodeLocator, reason: String },

    #[error("Depth limit exceeded at {locator}: depth {depth} is over the limit of {limit}")]
    DepthLimitExceeded {
        locator: NodeLocator,
        depth: usize,
        limit: usize,
    },

    #[error("Node limit exceeded at {locator}: more than {limit} nodes")]
    NodeLimitExceeded { locator: NodeLocator, limit: usize },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    pub(crate) fn malformed(locator: &NodeLocator, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            locator: locator.clone(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used by the CLI's JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "MALFORMED_INPUT",
            Self::DepthLimitExceeded { .. } | Self::NodeLimitExceeded { .. } => {
                "RESOURCE_EXHAUSTED"
            }
            Self::NodeNotFound(_) => "NODE_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Json(e) if e.is_io() => "IO_ERROR",
            Self::Json(_) => "INVALID_JSON",
        }
    }

    pub fn is_malformed(&self) -> bool {
        match self {
            Self::MalformedInput { .. } => true,
            Self::Json(e) => !e.is_io(),
            _ => false,
        }
    }

    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::DepthLimitExceeded { .. } | Self::NodeLimitExceeded { .. }
        )
    }

    /// Locator of the offending node, when the failure is tied to one.
    pub fn locator(&self) -> Option<&NodeLocator> {
        match self {
            Self::MalformedInput { locator, .. }
            | Self::DepthLimitExceeded { locator, .. }
            | Self::NodeLimitExceeded { locator, .. } => Some(locator),
            _ => None,
        }
    }
}

impl serde::Serialize for ExtractError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ExtractError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
