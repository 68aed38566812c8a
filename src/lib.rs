//! DesignTree Core - Design Tree Compiler
//!
//! # The Five Rules
//! 1. The Document Is Untrusted
//! 2. Traversal Order Is Contract
//! 3. Fail Fast, Never Partial
//! 4. Work Is Bounded
//! 5. No Hidden State

pub mod document;
pub mod error;
pub mod hashing;
pub mod images;
pub mod limits;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod tokens;
pub mod walk;

pub use document::{DesignFile, DesignNode, Paint, PaintKind, Rect, Rgba, TextStyle};
pub use error::{ExtractError, Result};
pub use hashing::{canonical_json, compute_source_hash};
pub use images::{collect_image_refs, ImageRef};
pub use limits::TraversalLimits;
pub use normalize::{normalize, normalize_with, ComponentStyles, NormalizedComponent};
pub use pipeline::{CodeStructure, DesignBundle, ExtractRequest, ExtractionPipeline, Framework};
pub use source::{DocumentSource, FileSource, ReaderSource};
pub use tokens::{extract_tokens, extract_tokens_with, ColorToken, DesignTokens, TypographyToken};
pub use walk::{walk_preorder, NodeLocator};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
