//! Structural validation of parsed source documents.
//!
//! Runs before any data-model construction and enforces the authoring
//! constraints of the source format: mappings only ever use plain string
//! keys, sibling keys are case-insensitively sorted, and nesting stays within
//! a fixed depth. The source grammar is a deliberately constrained subset of
//! YAML, so node kinds outside that subset are rejected outright.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::keys::{compare_keys, node_kind};

/// Cap on raw document nesting, over twice the feature-tree depth limit so
/// property values (sequences, mappings) below feature leaves still fit.
pub const MAX_STRUCTURE_DEPTH: usize = 20;

/// Validate a parsed document against the source authoring constraints.
///
/// Fails fast on the first violation. A document that passes is safe to hand
/// to the property extractor and renderer without re-checking key kinds.
pub fn validate_structure(node: &Value) -> Result<()> {
    walk(node, 0)
}

fn walk(node: &Value, level: usize) -> Result<()> {
    if level > MAX_STRUCTURE_DEPTH {
        return Err(Error::DepthExceeded {
            limit: MAX_STRUCTURE_DEPTH,
        });
    }

    match node {
        Value::Null | Value::String(_) => Ok(()),
        Value::Sequence(items) => {
            for item in items {
                walk(item, level + 1)?;
            }
            Ok(())
        }
        Value::Mapping(map) => validate_map_entries(map, level + 1),
        Value::Bool(_) | Value::Number(_) | Value::Tagged(_) => Err(Error::UnhandledNodeKind {
            actual: node_kind(node),
        }),
    }
}

/// Check one mapping's entries: string keys, sorted siblings, valid values.
fn validate_map_entries(map: &Mapping, level: usize) -> Result<()> {
    let mut previous: Option<&str> = None;
    for (key, value) in map {
        let Value::String(key) = key else {
            return Err(Error::NonStringKey {
                actual: node_kind(key),
            });
        };

        if let Some(previous) = previous {
            if compare_keys(key, previous) == std::cmp::Ordering::Less {
                return Err(Error::KeysNotSorted {
                    key: key.clone(),
                    previous: previous.to_string(),
                });
            }
        }
        previous = Some(key);

        walk(value, level + 1)?;
    }
    Ok(())
}
