//! Image references - nodes whose fills need a rendered export

use serde::{Deserialize, Serialize};

use crate::document::DesignNode;
use crate::error::Result;
use crate::limits::TraversalLimits;
use crate::walk::{walk_preorder, NodeLocator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub node_id: Option<String>,
    pub node_name: Option<String>,
    pub image_ref: Option<String>,
}

/// Every IMAGE fill in pre-order, one entry per fill.
pub fn collect_image_refs(root: &DesignNode, limits: &TraversalLimits) -> Result<Vec<ImageRef>> {
    collect_image_refs_at(root, NodeLocator::document(root.name.as_deref()), limits)
}

pub(crate) fn collect_image_refs_at(
    root: &DesignNode,
    origin: NodeLocator,
    limits: &TraversalLimits,
) -> Result<Vec<ImageRef>> {
    walk_preorder(root, origin, limits, Vec::new(), |mut refs, node, _| {
        for paint in node.fills.iter().flatten().filter(|p| p.is_image()) {
            refs.push(ImageRef {
                node_id: node.id.clone(),
                node_name: node.name.clone(),
                image_ref: paint.image_ref().map(str::to_string),
            });
        }
        Ok(refs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DesignFile;
    use serde_json::json;

    #[test]
    fn test_collects_image_fills_in_order() {
        let file = DesignFile::from_value(
            &json!({
                "document": {
                    "id": "0:1",
                    "name": "Page",
                    "fills": [{"type": "SOLID", "color": {"r": 1, "g": 1, "b": 1}}],
                    "children": [
                        {"id": "1:1", "name": "Hero", "fills": [{"type": "IMAGE", "imageRef": "abc123"}]},
                        {"name": "Avatar", "fills": [{"type": "IMAGE"}]}
                    ]
                }
            }),
            &TraversalLimits::default(),
        )
        .unwrap();

        let refs = collect_image_refs(&file.document, &TraversalLimits::default()).unwrap();
        assert_eq!(
            refs,
            vec![
                ImageRef {
                    node_id: Some("1:1".into()),
                    node_name: Some("Hero".into()),
                    image_ref: Some("abc123".into()),
                },
                ImageRef {
                    node_id: None,
                    node_name: Some("Avatar".into()),
                    image_ref: None,
                },
            ]
        );
    }
}
