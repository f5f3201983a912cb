//! Error types for the feature-matrix build.
//!
//! Every error here is fatal by design: the tool operates on hand-authored
//! static data, so any detected inconsistency is an authoring bug to be fixed
//! at the source. Nothing in the core catches or downgrades these; they
//! propagate to `main` and terminate the build before any output is written.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Sibling keys in a source mapping are not case-insensitively sorted.
    #[error("keys not sorted (\"{key}\" should not be after \"{previous}\")")]
    KeysNotSorted { key: String, previous: String },

    /// Recursion went deeper than the configured cap.
    #[error("recursion depth exceeded limit of {limit}")]
    DepthExceeded { limit: usize },

    /// A mapping key is not a plain string scalar.
    #[error("map keys must be plain string scalars, found {actual}")]
    NonStringKey { actual: &'static str },

    /// A node kind outside the constrained source grammar.
    #[error("unhandled node kind \"{actual}\"")]
    UnhandledNodeKind { actual: &'static str },

    /// A dotted key outside the recognized set for its context.
    #[error("property key '{name}' is not recognised")]
    UnrecognisedProperty { name: String },

    /// A string failed the specification-point grammar.
    #[error("value '{value}' is not formatted like a specification point")]
    MalformedSpecificationPoint { value: String },

    /// A string matched none of the recognized API shape-reference grammars.
    #[error("value '{value}' does not match any recognised API shape reference")]
    MalformedShapeReference { value: String },

    /// A documentation value is not a parseable URL.
    #[error("invalid documentation URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },

    /// A property expected a string but found another node kind.
    #[error("encountered {actual} when expecting a string")]
    ExpectedString { actual: &'static str },

    /// A property expected one or more values but the list was empty or null.
    #[error("expected a string or a non-empty list of strings")]
    NoValues,

    /// A manifest declares a feature path the canonical tree does not have.
    #[error("canonical node not found for manifest node at path \"{path}\"")]
    UnknownFeature { path: String },

    /// A manifest node that should be a mapping is something else.
    #[error("manifest node at path \"{path}\" should be a mapping but is {actual}")]
    ManifestNotMapping { path: String, actual: &'static str },

    /// A canonical node that should be a mapping is something else.
    #[error("canonical node at path \"{path}\" should be a mapping but is {actual}")]
    CanonicalNotMapping { path: String, actual: &'static str },

    /// The manifest document is missing its mandatory `compliance` mapping.
    #[error("manifest should have a '{key}' mapping")]
    MissingComplianceTree { key: &'static str },

    /// A compliance lookup hit a non-mapping, non-null intermediate node.
    #[error("manifest node with key '{key}' should be a mapping but is {actual}")]
    ComplianceNodeKind { key: String, actual: &'static str },

    /// A per-feature variants list was queried with no values.
    #[error("expected a non-empty list of variants")]
    EmptyVariants,

    /// A manifest reports per-feature variants but declares no canonical list.
    #[error("there is not a non-empty list of canonical variants to refer to")]
    NoCanonicalVariants,

    /// The document writer was asked to produce a second document.
    #[error("only a single document may be written for a single writer instance")]
    DocumentAlreadyWritten,

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
