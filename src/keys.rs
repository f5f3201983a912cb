//! Key comparison and dotted-key classification.
//!
//! One comparator serves both source-order validation and traversal order;
//! if these ever disagreed, validation and rendering would silently disagree
//! on what "sorted" means.

use std::cmp::Ordering;
use std::sync::LazyLock;

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use serde_yaml::Value;

/// Sentinel prefix marking a metadata (property) key.
pub const PROPERTY_SIGIL: char = '.';

/// Root-locale collator at primary strength: case and diacritics are ignored
/// for ordering purposes.
static COLLATOR: LazyLock<CollatorBorrowed<'static>> = LazyLock::new(|| {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Primary);
    Collator::try_new(Default::default(), options).expect("collation data is compiled in")
});

/// Compare two keys with locale-aware, case-insensitive ordering.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    COLLATOR.compare(a, b)
}

/// Whether a key is a reserved metadata key rather than a feature name.
pub fn is_property_key(key: &str) -> bool {
    key.starts_with(PROPERTY_SIGIL)
}

/// The property name of a dotted key, with the sentinel stripped.
pub fn property_key_name(key: &str) -> &str {
    key.strip_prefix(PROPERTY_SIGIL).unwrap_or(key)
}

/// Human-readable name of a YAML node kind, for error messages.
pub fn node_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_case_insensitively() {
        assert_eq!(compare_keys("apple", "Zebra"), Ordering::Less);
        assert_eq!(compare_keys("Zebra", "apple"), Ordering::Greater);
        assert_eq!(compare_keys("a", "A"), Ordering::Equal);
    }

    #[test]
    fn ignores_diacritics() {
        assert_eq!(compare_keys("étude", "etude"), Ordering::Equal);
    }

    #[test]
    fn classifies_property_keys() {
        assert!(is_property_key(".specification"));
        assert!(!is_property_key("Authentication"));
        assert_eq!(property_key_name(".synopsis"), "synopsis");
    }
}
