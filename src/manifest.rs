//! Per-SDK compliance manifests.
//!
//! A manifest mirrors a subset of the canonical feature tree under its
//! `compliance` mapping and may declare the full set of variant names the SDK
//! could support under a top-level `variants` list. Manifests may be partial;
//! they may never invent features the canonical tree does not have, and that
//! invariant is enforced at construction.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::keys::{is_property_key, node_kind};
use crate::properties::{Properties, PropertyContext};

pub const COMPLIANCE_KEY: &str = "compliance";
pub const VARIANTS_KEY: &str = "variants";

/// Cap on feature-path depth during cross-validation.
pub const MAX_FEATURE_DEPTH: usize = 10;

/// One SDK's compliance declaration, validated against the canonical tree.
#[derive(Debug)]
pub struct Manifest {
    document: Mapping,
}

impl Manifest {
    /// Construct a manifest from its parsed document, cross-validating every
    /// compliance path against the canonical feature tree.
    pub fn new(document: Value, canonical: &Value) -> Result<Self> {
        let document = match document {
            Value::Mapping(map) => map,
            other => {
                return Err(Error::ManifestNotMapping {
                    path: String::new(),
                    actual: node_kind(&other),
                })
            }
        };

        let Some(compliance) = document.get(COMPLIANCE_KEY) else {
            return Err(Error::MissingComplianceTree {
                key: COMPLIANCE_KEY,
            });
        };
        let Some(compliance) = compliance.as_mapping() else {
            return Err(Error::ManifestNotMapping {
                path: COMPLIANCE_KEY.to_string(),
                actual: node_kind(compliance),
            });
        };

        // The canonical variant list is optional, but if declared it must be
        // a non-empty list of strings.
        if let Some(variants) = document.get(VARIANTS_KEY) {
            let valid = matches!(variants, Value::Sequence(items)
                if !items.is_empty() && items.iter().all(|item| item.as_str().is_some()));
            if !valid {
                return Err(Error::NoCanonicalVariants);
            }
        }

        assert_subset(canonical, &mut Vec::new(), compliance)?;

        Ok(Self { document })
    }

    /// Test-only constructor that skips cross-validation, for exercising the
    /// accessor's own structural checks.
    #[cfg(test)]
    pub(crate) fn from_document_unchecked(document: Value) -> Self {
        let Value::Mapping(document) = document else {
            panic!("test manifest document should be a mapping");
        };
        Self { document }
    }

    fn compliance(&self) -> Option<&Mapping> {
        self.document.get(COMPLIANCE_KEY)?.as_mapping()
    }

    /// Locate the compliance node for a feature path, if this manifest covers
    /// it.
    ///
    /// Missing or null entries mean the feature is simply not covered; that
    /// is `Ok(None)`, not an error. A scalar or sequence where a mapping is
    /// required is structural corruption and fails.
    pub fn find(&self, feature_path: &[String]) -> Result<Option<Properties>> {
        let mut node = self.compliance();
        for component in feature_path {
            node = match node {
                None => None,
                Some(map) => match map.get(component.as_str()) {
                    None | Some(Value::Null) => None,
                    Some(Value::Mapping(child)) => Some(child),
                    Some(other) => {
                        return Err(Error::ComplianceNodeKind {
                            key: component.clone(),
                            actual: node_kind(other),
                        })
                    }
                },
            };
        }
        match node {
            None => Ok(None),
            Some(map) => Ok(Some(Properties::from_mapping(
                map,
                PropertyContext::Manifest,
            )?)),
        }
    }

    /// Whether a feature's reported variant coverage is a strict subset of
    /// the canonical variant list this manifest declares.
    pub fn is_partial_variants_coverage(&self, variants: &[String]) -> Result<bool> {
        if variants.is_empty() {
            return Err(Error::EmptyVariants);
        }

        let canonical = self
            .document
            .get(VARIANTS_KEY)
            .and_then(Value::as_sequence)
            .filter(|items| !items.is_empty())
            .ok_or(Error::NoCanonicalVariants)?;

        Ok(canonical
            .iter()
            .filter_map(Value::as_str)
            .any(|canonical_variant| {
                !variants.iter().any(|variant| variant == canonical_variant)
            }))
    }
}

/// Check that every feature path in a manifest node exists in the canonical
/// tree. The inverse is not required: manifests may be partial.
fn assert_subset(canonical: &Value, path: &mut Vec<String>, manifest_node: &Mapping) -> Result<()> {
    if path.len() > MAX_FEATURE_DEPTH {
        return Err(Error::DepthExceeded {
            limit: MAX_FEATURE_DEPTH,
        });
    }

    for (key, value) in manifest_node {
        let Some(key) = key.as_str() else {
            return Err(Error::NonStringKey {
                actual: node_kind(key),
            });
        };
        if is_property_key(key) {
            continue;
        }

        path.push(key.to_string());

        let Value::Mapping(canonical_map) = canonical else {
            return Err(Error::CanonicalNotMapping {
                path: display_path(path),
                actual: node_kind(canonical),
            });
        };
        let Some(canonical_value) = canonical_map.get(key) else {
            return Err(Error::UnknownFeature {
                path: display_path(path),
            });
        };

        // A null manifest value declares compliance with no nested detail and
        // terminates recursion for the branch.
        match value {
            Value::Null => {}
            Value::Mapping(child) => assert_subset(canonical_value, path, child)?,
            other => {
                return Err(Error::ManifestNotMapping {
                    path: display_path(path),
                    actual: node_kind(other),
                })
            }
        }

        path.pop();
    }
    Ok(())
}

fn display_path(path: &[String]) -> String {
    path.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Value {
        serde_yaml::from_str(source).expect("fixture should parse")
    }

    fn feature_path(components: &[&str]) -> Vec<String> {
        components.iter().map(|c| c.to_string()).collect()
    }

    const CANONICAL: &str = "\
Authentication:
  basic:
  Token:
    Renewal:
Channels:
  Presence:
  Publish: supported
";

    #[test]
    fn accepts_a_partial_manifest() {
        let canonical = parse(CANONICAL);
        let manifest = parse("compliance:\n  Channels:\n    Publish:\n");
        assert!(Manifest::new(manifest, &canonical).is_ok());
    }

    #[test]
    fn rejects_manifest_inventing_a_feature() {
        let canonical = parse("A:\n  B: x\n");
        let manifest = parse("compliance:\n  A:\n    C:\n");
        let err = Manifest::new(manifest, &canonical).unwrap_err();
        assert!(matches!(err, Error::UnknownFeature { .. }));
        assert_eq!(err.to_string(), "canonical node not found for manifest node at path \"A: C\"");
    }

    #[test]
    fn rejects_manifest_without_compliance_tree() {
        let canonical = parse(CANONICAL);
        let manifest = parse("variants:\n  - rest\n");
        assert!(matches!(
            Manifest::new(manifest, &canonical),
            Err(Error::MissingComplianceTree { .. })
        ));
    }

    #[test]
    fn rejects_scalar_compliance_values() {
        let canonical = parse(CANONICAL);
        let manifest = parse("compliance:\n  Channels: yes please\n");
        assert!(matches!(
            Manifest::new(manifest, &canonical),
            Err(Error::ManifestNotMapping { .. })
        ));
    }

    #[test]
    fn rejects_empty_canonical_variants_list() {
        let canonical = parse(CANONICAL);
        let manifest = parse("compliance:\n  Channels:\nvariants: []\n");
        assert!(matches!(
            Manifest::new(manifest, &canonical),
            Err(Error::NoCanonicalVariants)
        ));
    }

    #[test]
    fn find_returns_properties_for_covered_features() {
        let canonical = parse(CANONICAL);
        let manifest = Manifest::new(
            parse("compliance:\n  Channels:\n    Presence:\n      .variants:\n        - rest\n"),
            &canonical,
        )
        .unwrap();

        let properties = manifest
            .find(&feature_path(&["Channels", "Presence"]))
            .unwrap()
            .expect("feature should be covered");
        assert_eq!(properties.variants.unwrap(), vec!["rest".to_string()]);
    }

    #[test]
    fn find_returns_none_for_uncovered_features() {
        let canonical = parse(CANONICAL);
        let manifest =
            Manifest::new(parse("compliance:\n  Channels:\n    Presence:\n"), &canonical).unwrap();

        assert!(manifest
            .find(&feature_path(&["Authentication", "Token"]))
            .unwrap()
            .is_none());
        // a null leaf registers no compliance detail and reads as uncovered
        assert!(manifest
            .find(&feature_path(&["Channels", "Presence"]))
            .unwrap()
            .is_none());
        // descending past a null branch is not an error either
        assert!(manifest
            .find(&feature_path(&["Channels", "Presence", "Enter"]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn find_fails_on_scalar_intermediate_nodes() {
        let manifest = Manifest::from_document_unchecked(parse(
            "compliance:\n  Channels:\n    Publish: oops\n",
        ));
        let err = manifest
            .find(&feature_path(&["Channels", "Publish"]))
            .unwrap_err();
        assert!(matches!(err, Error::ComplianceNodeKind { .. }));
        assert!(err.to_string().contains("Publish"));
    }

    #[test]
    fn partial_variants_coverage_truth_table() {
        let canonical = parse(CANONICAL);
        let manifest = Manifest::new(
            parse("compliance:\n  Channels:\nvariants:\n  - x\n  - y\n"),
            &canonical,
        )
        .unwrap();

        assert!(manifest
            .is_partial_variants_coverage(&feature_path(&["x"]))
            .unwrap());
        assert!(!manifest
            .is_partial_variants_coverage(&feature_path(&["x", "y"]))
            .unwrap());
        assert!(matches!(
            manifest.is_partial_variants_coverage(&[]),
            Err(Error::EmptyVariants)
        ));
    }

    #[test]
    fn partial_variants_coverage_requires_a_canonical_list() {
        let canonical = parse(CANONICAL);
        let manifest =
            Manifest::new(parse("compliance:\n  Channels:\n"), &canonical).unwrap();
        assert!(matches!(
            manifest.is_partial_variants_coverage(&feature_path(&["x"])),
            Err(Error::NoCanonicalVariants)
        ));
    }
}
