//! Token Extractor
//!
//! Collects every SOLID fill color and every text style that names a font
//! family into flat maps keyed `color-<n>` / `font-<n>`, where `n` is the
//! number of entries already collected. Repeated values are not merged:
//! each occurrence gets its own key.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use tracing::debug;

use crate::document::{DesignNode, Rgba, TextStyle};
use crate::error::{ExtractError, Result};
use crate::limits::TraversalLimits;
use crate::walk::{walk_preorder, NodeLocator};

pub const DEFAULT_FONT_SIZE: u64 = 16;
pub const DEFAULT_FONT_WEIGHT: u64 = 400;

/// Resolved color; components are always floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorToken {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl From<&Rgba> for ColorToken {
    fn from(color: &Rgba) -> Self {
        Self {
            r: component(&color.r),
            g: component(&color.g),
            b: component(&color.b),
            a: color.alpha(),
        }
    }
}

fn component(value: &Number) -> f64 {
    value.as_f64().unwrap_or_default()
}

/// Font sizes and weights keep the number form the source used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyToken {
    pub font_family: String,
    pub font_size: Number,
    pub font_weight: Number,
}

impl TypographyToken {
    /// `None` unless the style names a font family.
    pub fn from_style(style: &TextStyle) -> Option<Self> {
        let font_family = style.font_family.clone()?;
        Some(Self {
            font_family,
            font_size: style.font_size.clone().unwrap_or_else(|| DEFAULT_FONT_SIZE.into()),
            font_weight: style.font_weight.clone().unwrap_or_else(|| DEFAULT_FONT_WEIGHT.into()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignTokens {
    pub colors: BTreeMap<String, ColorToken>,
    pub typography: BTreeMap<String, TypographyToken>,
}

impl DesignTokens {
    fn push_color(&mut self, token: ColorToken) {
        let key = format!("color-{}", self.colors.len());
        self.colors.insert(key, token);
    }

    fn push_typography(&mut self, token: TypographyToken) {
        let key = format!("font-{}", self.typography.len());
        self.typography.insert(key, token);
    }

    pub fn len(&self) -> usize {
        self.colors.len() + self.typography.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract tokens with the default [`TraversalLimits`].
pub fn extract_tokens(root: &DesignNode) -> Result<DesignTokens> {
    extract_tokens_with(root, &TraversalLimits::default())
}

pub fn extract_tokens_with(root: &DesignNode, limits: &TraversalLimits) -> Result<DesignTokens> {
    extract_tokens_at(root, NodeLocator::document(root.name.as_deref()), limits)
}

pub(crate) fn extract_tokens_at(
    root: &DesignNode,
    origin: NodeLocator,
    limits: &TraversalLimits,
) -> Result<DesignTokens> {
    let tokens = walk_preorder(root, origin, limits, DesignTokens::default(), collect_node)?;
    debug!(
        colors = tokens.colors.len(),
        typography = tokens.typography.len(),
        "extracted design tokens"
    );
    Ok(tokens)
}

fn collect_node(mut tokens: DesignTokens, node: &DesignNode, locator: &NodeLocator) -> Result<DesignTokens> {
    for (index, paint) in node.fills.iter().flatten().enumerate() {
        if !paint.is_solid() {
            continue;
        }
        let color = paint.color.as_ref().ok_or_else(|| {
            ExtractError::malformed(locator, format!("SOLID fill `fills[{index}]` has no `color`"))
        })?;
        tokens.push_color(ColorToken::from(color));
    }

    if let Some(token) = node.style.as_ref().and_then(TypographyToken::from_style) {
        tokens.push_typography(token);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Paint, PaintKind};
    use serde_json::Map;

    fn text(name: &str, family: Option<&str>) -> DesignNode {
        DesignNode {
            name: Some(name.to_string()),
            node_type: Some("TEXT".to_string()),
            style: Some(TextStyle {
                font_family: family.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_keys_follow_preorder() {
        let root = DesignNode {
            name: Some("Root".into()),
            fills: Some(vec![Paint::solid(1.0, 0.0, 0.0)]),
            children: vec![
                DesignNode {
                    fills: Some(vec![Paint::solid(0.0, 1.0, 0.0)]),
                    children: vec![DesignNode {
                        fills: Some(vec![Paint::solid(0.0, 0.0, 1.0)]),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                DesignNode {
                    fills: Some(vec![Paint::solid(0.5, 0.5, 0.5)]),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let tokens = extract_tokens(&root).unwrap();
        assert_eq!(tokens.colors["color-0"].r, 1.0);
        assert_eq!(tokens.colors["color-1"].g, 1.0);
        assert_eq!(tokens.colors["color-2"].b, 1.0);
        assert_eq!(tokens.colors["color-3"].r, 0.5);
    }

    #[test]
    fn test_duplicate_colors_not_merged() {
        let root = DesignNode {
            fills: Some(vec![Paint::solid(1.0, 1.0, 1.0), Paint::solid(1.0, 1.0, 1.0)]),
            ..Default::default()
        };

        let tokens = extract_tokens(&root).unwrap();
        assert_eq!(tokens.colors.len(), 2);
        assert_eq!(tokens.colors["color-0"], tokens.colors["color-1"]);
    }

    #[test]
    fn test_non_solid_fills_ignored() {
        let gradient = Paint {
            kind: Some(PaintKind::Other("GRADIENT_RADIAL".into())),
            color: None,
            extra: Map::new(),
        };
        let untyped = Paint {
            kind: None,
            color: Some(Rgba::new(0.1, 0.2, 0.3)),
            extra: Map::new(),
        };
        let root = DesignNode {
            fills: Some(vec![gradient, Paint::solid(0.2, 0.2, 0.2), untyped]),
            ..Default::default()
        };

        let tokens = extract_tokens(&root).unwrap();
        assert_eq!(tokens.colors.len(), 1);
        assert_eq!(tokens.colors["color-0"].r, 0.2);
    }

    #[test]
    fn test_strokes_not_tokenized() {
        let root = DesignNode {
            strokes: Some(vec![Paint::solid(0.0, 0.0, 0.0)]),
            ..Default::default()
        };
        assert!(extract_tokens(&root).unwrap().is_empty());
    }

    #[test]
    fn test_alpha_kept_when_declared() {
        let mut fill = Paint::solid(0.0, 0.0, 0.0);
        fill.color = fill.color.map(|c| c.with_alpha(0.25));
        let root = DesignNode {
            fills: Some(vec![fill]),
            ..Default::default()
        };

        assert_eq!(extract_tokens(&root).unwrap().colors["color-0"].a, 0.25);
    }

    #[test]
    fn test_style_without_family_skipped() {
        let root = DesignNode {
            children: vec![text("Untitled", None), text("Body", Some("Roboto"))],
            ..Default::default()
        };

        let tokens = extract_tokens(&root).unwrap();
        assert_eq!(tokens.typography.len(), 1);
        assert_eq!(tokens.typography["font-0"].font_family, "Roboto");
        assert_eq!(tokens.typography["font-0"].font_size, Number::from(DEFAULT_FONT_SIZE));
        assert_eq!(tokens.typography["font-0"].font_weight, Number::from(DEFAULT_FONT_WEIGHT));
    }

    #[test]
    fn test_solid_without_color_names_node() {
        let broken = Paint {
            kind: Some(PaintKind::Solid),
            color: None,
            extra: Map::new(),
        };
        let root = DesignNode {
            name: Some("Root".into()),
            children: vec![DesignNode {
                name: Some("Swatch".into()),
                fills: Some(vec![Paint::solid(1.0, 1.0, 1.0), broken]),
                ..Default::default()
            }],
            ..Default::default()
        };

        let err = extract_tokens(&root).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(
            err.to_string(),
            r#"Malformed input at document.children[0] ("Swatch"): SOLID fill `fills[1]` has no `color`"#
        );
    }
}
