//! Hashing - SHA-256 over canonical JSON
//!
//! Identical designs hash identically regardless of key order, so a code
//! synthesis consumer can cache on `source_hash`.

use serde::Serialize;
use serde_json::to_string;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace).
///
/// `serde_json::Map` is backed by a `BTreeMap` unless `preserve_order` is
/// enabled, so going through `Value` already sorts keys at every level.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    to_string(&serde_json::to_value(value)?)
}

/// Hash of the design subtree a bundle was built from.
pub fn compute_source_hash<T: Serialize>(source: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(source)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DesignFile, DesignNode, Paint};
    use crate::limits::TraversalLimits;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_canonical_json_sorts_nested_objects() {
        let obj = json!({"b": [{"y": 1, "x": 2}], "a": {"d": null, "c": true}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":{"c":true,"d":null},"b":[{"x":2,"y":1}]}"#);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_source_hash_ignores_key_order() {
        let limits = TraversalLimits::default();
        let a = DesignFile::from_value(
            &json!({"document": {"name": "Root", "type": "FRAME", "fills": []}}),
            &limits,
        )
        .unwrap();
        let b = DesignFile::from_value(
            &json!({"document": {"fills": [], "type": "FRAME", "name": "Root"}}),
            &limits,
        )
        .unwrap();

        assert_eq!(
            compute_source_hash(&a.document).unwrap(),
            compute_source_hash(&b.document).unwrap()
        );
    }

    #[test]
    fn test_source_hash_tracks_content() {
        let plain = DesignNode::default();
        let filled = DesignNode {
            fills: Some(vec![Paint::solid(1.0, 1.0, 1.0)]),
            ..Default::default()
        };
        assert_ne!(
            compute_source_hash(&plain).unwrap(),
            compute_source_hash(&filled).unwrap()
        );
    }
}
