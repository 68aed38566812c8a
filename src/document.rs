//! Design Document - typed view of an untrusted design file
//!
//! The provider's response is loosely typed JSON. Parsing turns it into
//! records with explicit presence: an absent (or `null`) field is `None`,
//! a present field of the wrong JSON type is rejected with the locator of
//! the node that carried it. Numbers stay `serde_json::Number`, so an
//! integer in the source is still an integer in the normalized output.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{ExtractError, Result};
use crate::limits::TraversalLimits;
use crate::walk::{NodeLocator, TraversalGuard};

/// Top-level file response. Only `document` is required.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub document: DesignNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_bounding_box: Option<Rect>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DesignNode>,
}

/// A fill or stroke. Fields other than `type` and `color` are kept
/// verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paint {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PaintKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintKind {
    Solid,
    Image,
    Other(String),
}

impl PaintKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SOLID" => Self::Solid,
            "IMAGE" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Solid => "SOLID",
            Self::Image => "IMAGE",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for PaintKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Color components in `[0, 1]`. `a` is kept as declared; use
/// [`Rgba::alpha`] for the resolved value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rgba {
    pub r: Number,
    pub g: Number,
    pub b: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<Number>,
}

pub const DEFAULT_ALPHA: f64 = 1.0;

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: finite(r),
            g: finite(g),
            b: finite(b),
            a: None,
        }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: Some(finite(a)),
            ..self
        }
    }

    pub fn alpha(&self) -> f64 {
        self.a.as_ref().and_then(Number::as_f64).unwrap_or(DEFAULT_ALPHA)
    }
}

// NaN and infinities have no JSON form.
fn finite(value: f64) -> Number {
    Number::from_f64(value).unwrap_or_else(|| Number::from(0))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Absolute bounding box. An absent box is the empty `Rect`, which
/// serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rect {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Number>,
}

impl Rect {
    pub fn new(
        x: impl Into<Number>,
        y: impl Into<Number>,
        width: impl Into<Number>,
        height: impl Into<Number>,
    ) -> Self {
        Self {
            x: Some(x.into()),
            y: Some(y.into()),
            width: Some(width.into()),
            height: Some(height.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Paint {
    pub fn solid(r: f64, g: f64, b: f64) -> Self {
        Self {
            kind: Some(PaintKind::Solid),
            color: Some(Rgba::new(r, g, b)),
            extra: Map::new(),
        }
    }

    pub fn is_solid(&self) -> bool {
        self.kind == Some(PaintKind::Solid)
    }

    pub fn is_image(&self) -> bool {
        self.kind == Some(PaintKind::Image)
    }

    /// Provider-side image hash of an IMAGE paint.
    pub fn image_ref(&self) -> Option<&str> {
        self.extra.get("imageRef").and_then(Value::as_str)
    }
}

/// JSON nesting that the paint, color and style objects of a node may add
/// beyond its own object and `children` array.
const NESTING_SLACK: usize = 16;

impl DesignFile {
    /// Parse a raw response. Nesting is measured before any recursive
    /// parsing, so an over-deep document fails with `DepthLimitExceeded`
    /// however deep it goes, and `max_depth` is not capped by the JSON
    /// parser's own nesting limit.
    pub fn from_json_str(json: &str, limits: &TraversalLimits) -> Result<Self> {
        // response object + document object, then two levels per child.
        let budget = limits
            .max_depth
            .saturating_mul(2)
            .saturating_add(2 + NESTING_SLACK);
        let nesting = json_nesting(json);
        if nesting > budget {
            return Err(ExtractError::DepthLimitExceeded {
                locator: NodeLocator::document(None),
                depth: nesting.saturating_sub(2) / 2,
                limit: limits.max_depth,
            });
        }

        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let value = Value::deserialize(&mut de)?;
        de.end()?;
        Self::from_value(&value, limits)
    }

    pub fn from_value(value: &Value, limits: &TraversalLimits) -> Result<Self> {
        let top = NodeLocator::document(None);
        let obj = value
            .as_object()
            .ok_or_else(|| ExtractError::malformed(&top, format!("response must be an object, found {}", json_kind(value))))?;

        let document = field(obj, "document")
            .ok_or_else(|| ExtractError::malformed(&top, "response has no `document`"))?;

        let mut parser = Parser {
            guard: TraversalGuard::new(limits),
        };
        let root_name = document.get("name").and_then(Value::as_str);
        let document = parser.node(document, &NodeLocator::document(root_name))?;

        Ok(Self {
            name: opt_string(obj, "name", &top)?,
            last_modified: opt_string(obj, "lastModified", &top)?,
            version: opt_string(obj, "version", &top)?,
            document,
        })
    }
}

impl DesignNode {
    /// Parse a single node tree, e.g. one entry of a `nodes` response.
    pub fn from_value(value: &Value, limits: &TraversalLimits) -> Result<Self> {
        let mut parser = Parser {
            guard: TraversalGuard::new(limits),
        };
        let name = value.get("name").and_then(Value::as_str);
        parser.node(value, &NodeLocator::document(name))
    }

    /// First node in pre-order whose `id` matches.
    pub fn find(&self, id: &str) -> Option<&DesignNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id.as_deref() == Some(id) {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

struct Parser<'a> {
    guard: TraversalGuard<'a>,
}

impl Parser<'_> {
    fn node(&mut self, value: &Value, locator: &NodeLocator) -> Result<DesignNode> {
        self.guard.enter(locator)?;

        let obj = value.as_object().ok_or_else(|| {
            ExtractError::malformed(locator, format!("node must be an object, found {}", json_kind(value)))
        })?;

        let mut node = DesignNode {
            id: opt_string(obj, "id", locator)?,
            name: opt_string(obj, "name", locator)?,
            node_type: opt_string(obj, "type", locator)?,
            fills: paints(obj, "fills", locator)?,
            strokes: paints(obj, "strokes", locator)?,
            style: text_style(obj, locator)?,
            absolute_bounding_box: rect(obj, locator)?,
            children: vec![],
        };

        node.children = match field(obj, "children") {
            None => vec![],
            Some(Value::Array(entries)) => {
                let mut children = Vec::with_capacity(entries.len());
                for (index, entry) in entries.iter().enumerate() {
                    if !entry.is_object() {
                        return Err(ExtractError::malformed(
                            locator,
                            format!("child #{index} is not a node object, found {}", json_kind(entry)),
                        ));
                    }
                    let name = entry.get("name").and_then(Value::as_str);
                    children.push(self.node(entry, &locator.child(index, name))?);
                }
                children
            }
            Some(other) => {
                return Err(ExtractError::malformed(
                    locator,
                    format!("field `children` must be an array, found {}", json_kind(other)),
                ))
            }
        };

        Ok(node)
    }
}

/// Deepest bracket nesting in `json`, ignoring brackets inside strings.
fn json_nesting(json: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                max = max.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

fn field<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn opt_string(obj: &Map<String, Value>, key: &str, locator: &NodeLocator) -> Result<Option<String>> {
    match field(obj, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ExtractError::malformed(
            locator,
            format!("field `{key}` must be a string, found {}", json_kind(other)),
        )),
    }
}

fn opt_number(obj: &Map<String, Value>, key: &str, context: &str, locator: &NodeLocator) -> Result<Option<Number>> {
    match field(obj, key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(other) => Err(ExtractError::malformed(
            locator,
            format!("field `{context}.{key}` must be a number, found {}", json_kind(other)),
        )),
    }
}

fn object<'v>(value: &'v Value, context: &str, locator: &NodeLocator) -> Result<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ExtractError::malformed(
            locator,
            format!("field `{context}` must be an object, found {}", json_kind(value)),
        )
    })
}

fn paints(obj: &Map<String, Value>, key: &str, locator: &NodeLocator) -> Result<Option<Vec<Paint>>> {
    let entries = match field(obj, key) {
        None => return Ok(None),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(ExtractError::malformed(
                locator,
                format!("field `{key}` must be an array, found {}", json_kind(other)),
            ))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| paint(entry, &format!("{key}[{index}]"), locator))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn paint(value: &Value, context: &str, locator: &NodeLocator) -> Result<Paint> {
    let obj = object(value, context, locator)?;

    let kind = match field(obj, "type") {
        None => None,
        Some(Value::String(raw)) => Some(PaintKind::parse(raw)),
        Some(other) => {
            return Err(ExtractError::malformed(
                locator,
                format!("field `{context}.type` must be a string, found {}", json_kind(other)),
            ))
        }
    };

    let color = match field(obj, "color") {
        None => None,
        Some(raw) => Some(rgba(raw, &format!("{context}.color"), locator)?),
    };

    let extra = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "type" && k.as_str() != "color")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Paint { kind, color, extra })
}

fn rgba(value: &Value, context: &str, locator: &NodeLocator) -> Result<Rgba> {
    let obj = object(value, context, locator)?;
    let component = |key: &str| -> Result<Number> {
        opt_number(obj, key, context, locator)?.ok_or_else(|| {
            ExtractError::malformed(locator, format!("field `{context}` has no `{key}` component"))
        })
    };

    Ok(Rgba {
        r: component("r")?,
        g: component("g")?,
        b: component("b")?,
        a: opt_number(obj, "a", context, locator)?,
    })
}

fn text_style(obj: &Map<String, Value>, locator: &NodeLocator) -> Result<Option<TextStyle>> {
    let Some(raw) = field(obj, "style") else {
        return Ok(None);
    };
    let style = object(raw, "style", locator)?;

    let extra = style
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "fontFamily" | "fontSize" | "fontWeight"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Some(TextStyle {
        font_family: opt_string(style, "fontFamily", locator)?,
        font_size: opt_number(style, "fontSize", "style", locator)?,
        font_weight: opt_number(style, "fontWeight", "style", locator)?,
        extra,
    }))
}

fn rect(obj: &Map<String, Value>, locator: &NodeLocator) -> Result<Option<Rect>> {
    const CONTEXT: &str = "absoluteBoundingBox";
    let Some(raw) = field(obj, CONTEXT) else {
        return Ok(None);
    };
    let bounds = object(raw, CONTEXT, locator)?;

    Ok(Some(Rect {
        x: opt_number(bounds, "x", CONTEXT, locator)?,
        y: opt_number(bounds, "y", CONTEXT, locator)?,
        width: opt_number(bounds, "width", CONTEXT, locator)?,
        height: opt_number(bounds, "height", CONTEXT, locator)?,
    }))
}
