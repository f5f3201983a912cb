//! Node metadata: dotted-key extraction and the typed values behind it.
//!
//! Tree nodes carry metadata through reserved keys prefixed with `.`. The
//! recognized set is closed per context: canonical feature trees describe
//! features (`.specification`, `.documentation`, `.synopsis`, `.inherit`)
//! while manifests describe compliance (`.api`, `.variants`, `.notes`). Any
//! other dotted key fails extraction immediately.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use url::Url;

use crate::error::{Error, Result};
use crate::keys::{is_property_key, node_kind, property_key_name};

/// A reference to a clause in the normative feature specification document.
///
/// The grammar is 1–3 uppercase letters, a positive integer with no leading
/// zero, then up to two optional lowercase-letter/integer refinements.
/// Matching is intentionally identical to the original authoring tool's
/// expression, quirks included (`RTE6aa` and `RTE6aa1` are accepted).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecificationPoint(String);

static SPECIFICATION_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,3}[1-9][0-9]*([a-z]((([1-9][0-9]*)?[a-z])?([1-9][0-9]*)?)?)?$")
        .expect("specification point pattern is valid")
});

impl SpecificationPoint {
    pub fn parse(value: &str) -> Result<Self> {
        if !SPECIFICATION_POINT.is_match(value) {
            return Err(Error::MalformedSpecificationPoint {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecificationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A path reference to another node in the tree, used by `.inherit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePointer {
    pub keys: Vec<String>,
}

impl fmt::Display for NodePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys.join(": "))
    }
}

/// A Smithy-style shape reference, in one of three closed grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeReference {
    /// `$member`: a member of the shape under discussion.
    Member { member: String },
    /// `namespace#Name`: an absolute shape identifier.
    Absolute { namespace: String, shape: String },
    /// `namespace#Name$member`: a member of an absolute shape.
    AbsoluteMember {
        namespace: String,
        shape: String,
        member: String,
    },
}

static MEMBER_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)$").expect("pattern is valid"));
static ABSOLUTE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)#([A-Za-z_][A-Za-z0-9_]*)(?:\$([A-Za-z_][A-Za-z0-9_]*))?$",
    )
    .expect("pattern is valid")
});

impl ShapeReference {
    pub fn parse(value: &str) -> Result<Self> {
        if let Some(captures) = MEMBER_REFERENCE.captures(value) {
            return Ok(Self::Member {
                member: captures[1].to_string(),
            });
        }
        if let Some(captures) = ABSOLUTE_SHAPE.captures(value) {
            let namespace = captures[1].to_string();
            let shape = captures[2].to_string();
            return Ok(match captures.get(3) {
                Some(member) => Self::AbsoluteMember {
                    namespace,
                    shape,
                    member: member.as_str().to_string(),
                },
                None => Self::Absolute { namespace, shape },
            });
        }
        Err(Error::MalformedShapeReference {
            value: value.to_string(),
        })
    }
}

impl fmt::Display for ShapeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member { member } => write!(f, "${member}"),
            Self::Absolute { namespace, shape } => write!(f, "{namespace}#{shape}"),
            Self::AbsoluteMember {
                namespace,
                shape,
                member,
            } => write!(f, "{namespace}#{shape}${member}"),
        }
    }
}

/// A target-language API shape reference, optionally carrying constructor
/// arguments (the structured YAML form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDefinition {
    pub shape: ShapeReference,
    pub arguments: Vec<String>,
}

impl ApiDefinition {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self {
                shape: ShapeReference::parse(text)?,
                arguments: Vec::new(),
            }),
            Value::Mapping(map) => Self::from_mapping(map),
            other => Err(Error::ExpectedString {
                actual: node_kind(other),
            }),
        }
    }

    fn from_mapping(map: &Mapping) -> Result<Self> {
        let mut shape = None;
        let mut arguments = Vec::new();
        for (key, value) in map {
            let Value::String(key) = key else {
                return Err(Error::NonStringKey {
                    actual: node_kind(key),
                });
            };
            match key.as_str() {
                "shape" => {
                    let Value::String(text) = value else {
                        return Err(Error::ExpectedString {
                            actual: node_kind(value),
                        });
                    };
                    shape = Some(ShapeReference::parse(text)?);
                }
                "arguments" => arguments = strings_of(value)?,
                other => {
                    return Err(Error::UnrecognisedProperty {
                        name: other.to_string(),
                    })
                }
            }
        }
        let Some(shape) = shape else {
            return Err(Error::MalformedShapeReference {
                value: "<missing shape>".to_string(),
            });
        };
        Ok(Self { shape, arguments })
    }
}

/// Structured compliance notes. Presence of any note marks a feature's
/// support as partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notes {
    /// Free-text reason the support is partial.
    pub partial: Option<String>,
}

impl Notes {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self {
                partial: Some(text.clone()),
            }),
            Value::Mapping(map) => {
                let mut partial = None;
                for (key, value) in map {
                    let Value::String(key) = key else {
                        return Err(Error::NonStringKey {
                            actual: node_kind(key),
                        });
                    };
                    match key.as_str() {
                        "partial" => partial = Some(string_of(value)?),
                        other => {
                            return Err(Error::UnrecognisedProperty {
                                name: other.to_string(),
                            })
                        }
                    }
                }
                Ok(Self { partial })
            }
            other => Err(Error::ExpectedString {
                actual: node_kind(other),
            }),
        }
    }
}

/// Which document a node belongs to, selecting the recognized property set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyContext {
    /// The canonical feature tree: descriptive metadata.
    Canonical,
    /// A per-SDK manifest: compliance metadata.
    Manifest,
}

/// The typed property bag extracted from one node's dotted keys.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    pub specification_points: Option<Vec<SpecificationPoint>>,
    pub documentation_urls: Option<Vec<Url>>,
    pub synopsis: Option<String>,
    pub parent_pointer: Option<NodePointer>,
    pub api: Option<Vec<ApiDefinition>>,
    pub variants: Option<Vec<String>>,
    pub notes: Option<Notes>,
}

impl Properties {
    /// Extract properties from a node. Non-mapping nodes carry none.
    pub fn from_node(node: &Value, context: PropertyContext) -> Result<Self> {
        match node {
            Value::Mapping(map) => Self::from_mapping(map, context),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_mapping(map: &Mapping, context: PropertyContext) -> Result<Self> {
        let mut properties = Self::default();
        for (key, value) in map {
            let Some(key) = key.as_str() else {
                return Err(Error::NonStringKey {
                    actual: node_kind(key),
                });
            };
            if !is_property_key(key) {
                continue;
            }
            let name = property_key_name(key);
            match (context, name) {
                (PropertyContext::Canonical, "specification") => {
                    properties.specification_points = Some(
                        strings_of(value)?
                            .iter()
                            .map(|text| SpecificationPoint::parse(text))
                            .collect::<Result<Vec<_>>>()?,
                    );
                }
                (PropertyContext::Canonical, "documentation") => {
                    properties.documentation_urls = Some(
                        strings_of(value)?
                            .iter()
                            .map(|text| {
                                Url::parse(text).map_err(|source| Error::InvalidUrl {
                                    value: text.clone(),
                                    source,
                                })
                            })
                            .collect::<Result<Vec<_>>>()?,
                    );
                }
                (PropertyContext::Canonical, "synopsis") => {
                    properties.synopsis = Some(string_of(value)?);
                }
                (PropertyContext::Canonical, "inherit") => {
                    properties.parent_pointer = Some(NodePointer {
                        keys: strings_of(value)?,
                    });
                }
                (PropertyContext::Manifest, "api") => {
                    properties.api = Some(api_definitions_of(value)?);
                }
                (PropertyContext::Manifest, "variants") => {
                    properties.variants = Some(strings_of(value)?);
                }
                (PropertyContext::Manifest, "notes") => {
                    properties.notes = Some(Notes::from_value(value)?);
                }
                _ => {
                    return Err(Error::UnrecognisedProperty {
                        name: name.to_string(),
                    })
                }
            }
        }
        Ok(properties)
    }
}

/// A single string value. Anything else is a type mismatch.
fn string_of(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(Error::ExpectedString {
            actual: node_kind(other),
        }),
    }
}

/// A single string or a non-empty list of strings. Null and empty lists are
/// authoring errors.
fn strings_of(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Err(Error::NoValues),
        Value::String(text) => Ok(vec![text.clone()]),
        Value::Sequence(items) => {
            if items.is_empty() {
                return Err(Error::NoValues);
            }
            items.iter().map(string_of).collect()
        }
        other => Err(Error::ExpectedString {
            actual: node_kind(other),
        }),
    }
}

/// A single API definition or a non-empty list of them.
fn api_definitions_of(value: &Value) -> Result<Vec<ApiDefinition>> {
    match value {
        Value::Null => Err(Error::NoValues),
        Value::Sequence(items) => {
            if items.is_empty() {
                return Err(Error::NoValues);
            }
            items.iter().map(ApiDefinition::from_value).collect()
        }
        single => Ok(vec![ApiDefinition::from_value(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specification_point_accepts_valid_strings() {
        for valid in [
            // real examples from the specification document
            "RSC7d6b", "RSA4d1", "RTN13", "RTE6a", "TG7", "TS12n",
            // allowed though not seen in practice
            "A1", "A23", "AA1", "AA45", "AAA1", "AAA67",
            // deepest supported
            "A1b2c3", "AAA1234567890b1234567890c1234567890",
            // accidental inputs the grammar knowingly accepts
            "RTE6aa", "RTE6aa1",
        ] {
            let point = SpecificationPoint::parse(valid)
                .unwrap_or_else(|_| panic!("'{valid}' should parse"));
            assert_eq!(point.to_string(), valid);
        }
    }

    #[test]
    fn specification_point_rejects_invalid_strings() {
        for invalid in [
            "", " ", "Hello",
            // surrounding whitespace
            " RTN13", "RTN13 ", " TG7", "TG7 ",
            // incorrect casing
            "rsc7d6b", "rSA4d1", "Rtn13", "RtE6a", "tg7", "Ts12n", "RSC7d6B", "RSA4D1",
            // too many initial capital letters
            "ABCD1", "ABCD1e2f",
            // leading zeros
            "A01", "AAA01", "AAA001", "A1b02", "A1b2c03",
            // deeper than supported
            "A1b2c3d",
            // missing the integer
            "RSAd1",
        ] {
            assert!(
                SpecificationPoint::parse(invalid).is_err(),
                "'{invalid}' should not parse"
            );
        }
    }

    #[test]
    fn shape_reference_grammars() {
        assert_eq!(
            ShapeReference::parse("$items").unwrap(),
            ShapeReference::Member {
                member: "items".into()
            }
        );
        assert_eq!(
            ShapeReference::parse("com.example#Channel").unwrap(),
            ShapeReference::Absolute {
                namespace: "com.example".into(),
                shape: "Channel".into()
            }
        );
        assert_eq!(
            ShapeReference::parse("com.example#Channel$publish").unwrap(),
            ShapeReference::AbsoluteMember {
                namespace: "com.example".into(),
                shape: "Channel".into(),
                member: "publish".into()
            }
        );

        for invalid in ["Channel", "com.example#", "$", "#Channel", "a#b#c", "a..b#C"] {
            assert!(
                ShapeReference::parse(invalid).is_err(),
                "'{invalid}' should not parse"
            );
        }
    }

    #[test]
    fn shape_reference_display_round_trips() {
        for text in ["$items", "com.example#Channel", "com.example#Channel$publish"] {
            assert_eq!(ShapeReference::parse(text).unwrap().to_string(), text);
        }
    }

    fn parse(source: &str) -> Value {
        serde_yaml::from_str(source).expect("fixture should parse")
    }

    #[test]
    fn extracts_canonical_properties() {
        let node = parse(
            ".documentation:\n  - https://example.com/docs/channels\n.specification:\n  - RTN13\n  - TG7\n.synopsis: Realtime channel *attach*.\n",
        );
        let properties = Properties::from_node(&node, PropertyContext::Canonical).unwrap();
        let points = properties.specification_points.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].as_str(), "RTN13");
        assert_eq!(
            properties.documentation_urls.unwrap()[0].as_str(),
            "https://example.com/docs/channels"
        );
        assert_eq!(
            properties.synopsis.as_deref(),
            Some("Realtime channel *attach*.")
        );
    }

    #[test]
    fn extracts_manifest_properties() {
        let node = parse(".api: com.example#Rest$request\n.notes: partial pagination only\n.variants:\n  - rest\n");
        let properties = Properties::from_node(&node, PropertyContext::Manifest).unwrap();
        assert_eq!(properties.api.unwrap().len(), 1);
        assert_eq!(properties.variants.unwrap(), vec!["rest".to_string()]);
        assert_eq!(
            properties.notes.unwrap().partial.as_deref(),
            Some("partial pagination only")
        );
    }

    #[test]
    fn non_mapping_nodes_carry_no_properties() {
        let properties =
            Properties::from_node(&Value::String("leaf".into()), PropertyContext::Canonical)
                .unwrap();
        assert!(properties.specification_points.is_none());
        assert!(properties.synopsis.is_none());
    }

    #[test]
    fn rejects_non_string_map_keys() {
        let node = parse("1: one\n.synopsis: text\n");
        assert!(matches!(
            Properties::from_node(&node, PropertyContext::Canonical),
            Err(Error::NonStringKey { actual: "number" })
        ));
    }

    #[test]
    fn rejects_unrecognised_property_keys() {
        let node = parse(".bogus: whatever\n");
        let err = Properties::from_node(&node, PropertyContext::Canonical).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn property_sets_are_per_context() {
        // manifest-only keys are unrecognised in the canonical tree
        let node = parse(".variants:\n  - rest\n");
        assert!(Properties::from_node(&node, PropertyContext::Canonical).is_err());

        // and canonical keys are unrecognised in manifests
        let node = parse(".specification: RTN13\n");
        assert!(Properties::from_node(&node, PropertyContext::Manifest).is_err());
    }

    #[test]
    fn rejects_empty_and_null_lists() {
        let node = parse(".specification: []\n");
        assert!(matches!(
            Properties::from_node(&node, PropertyContext::Canonical),
            Err(Error::NoValues)
        ));

        let node = parse(".specification:\n");
        assert!(matches!(
            Properties::from_node(&node, PropertyContext::Canonical),
            Err(Error::NoValues)
        ));
    }

    #[test]
    fn rejects_non_string_values_naming_the_kind() {
        let node = parse(".synopsis:\n  - not\n  - a\n  - string\n");
        assert!(matches!(
            Properties::from_node(&node, PropertyContext::Canonical),
            Err(Error::ExpectedString { actual: "sequence" })
        ));
    }

    #[test]
    fn rejects_invalid_documentation_urls() {
        let node = parse(".documentation: not-a-url\n");
        assert!(matches!(
            Properties::from_node(&node, PropertyContext::Canonical),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn structured_api_definition_with_arguments() {
        let node = parse(".api:\n  shape: com.example#Channel\n  arguments:\n    - name\n");
        let properties = Properties::from_node(&node, PropertyContext::Manifest).unwrap();
        let api = properties.api.unwrap();
        assert_eq!(api[0].arguments, vec!["name".to_string()]);
    }

    #[test]
    fn structured_api_definition_rejects_unknown_keys() {
        let node = parse(".api:\n  shape: com.example#Channel\n  wat: nope\n");
        assert!(Properties::from_node(&node, PropertyContext::Manifest).is_err());
    }
}
