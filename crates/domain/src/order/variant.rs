//! Denormalised variant labels on order detail rows.

use store::DEFAULT_VARIANT_TYPE;

/// The `type1-type2` label stored on an order detail.
///
/// A type named `default` contributes nothing, so a single-axis variant is
/// labelled `"red"` and a product without variants gets an empty label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantLabel;

impl VariantLabel {
    pub fn build(first_type: &str, second_type: &str) -> String {
        let first = visible(first_type);
        let second = visible(second_type);
        if first.is_empty() || second.is_empty() {
            format!("{first}{second}")
        } else {
            format!("{first}-{second}")
        }
    }

    /// Recovers the two type names from a label.
    ///
    /// Only the first hyphen separates the types. Labels built from a type
    /// name that itself contains `-` do not split back to the same pair, and
    /// a label for (`default`, `XL`) splits as (`XL`, `default`).
    pub fn split(label: &str) -> (String, String) {
        match label.split_once('-') {
            Some((first, second)) => (first.to_string(), second.to_string()),
            None if label.is_empty() => (
                DEFAULT_VARIANT_TYPE.to_string(),
                DEFAULT_VARIANT_TYPE.to_string(),
            ),
            None => (label.to_string(), DEFAULT_VARIANT_TYPE.to_string()),
        }
    }
}

fn visible(type_name: &str) -> &str {
    if type_name == DEFAULT_VARIANT_TYPE {
        ""
    } else {
        type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_skips_default_types() {
        assert_eq!(VariantLabel::build("red", "XL"), "red-XL");
        assert_eq!(VariantLabel::build("red", "default"), "red");
        assert_eq!(VariantLabel::build("default", "XL"), "XL");
        assert_eq!(VariantLabel::build("default", "default"), "");
    }

    #[test]
    fn test_split_fills_defaults() {
        assert_eq!(
            VariantLabel::split(""),
            ("default".to_string(), "default".to_string())
        );
        assert_eq!(
            VariantLabel::split("red"),
            ("red".to_string(), "default".to_string())
        );
        assert_eq!(
            VariantLabel::split("red-XL"),
            ("red".to_string(), "XL".to_string())
        );
    }

    #[test]
    fn test_hyphenated_type_names_are_ambiguous() {
        let label = VariantLabel::build("navy-blue", "XL");
        assert_ne!(
            VariantLabel::split(&label),
            ("navy-blue".to_string(), "XL".to_string())
        );
    }
}
