//! Field validators
//!
//! Each validator takes the proposed value and the field name and returns the
//! list of problems found. They never touch remote state and run before any
//! API call is made.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Storage account types accepted by the API, in the API's spelling
pub const STORAGE_ACCOUNT_TYPES: [&str; 5] = [
    "Standard_LRS",
    "Standard_ZRS",
    "Standard_GRS",
    "Standard_RAGRS",
    "Premium_LRS",
];

pub const MAX_TAGS: usize = 15;
pub const MAX_TAG_KEY_LEN: usize = 512;
pub const MAX_TAG_VALUE_LEN: usize = 256;

static STORAGE_ACCOUNT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[a-z0-9]{3,24}\z").expect("storage account name pattern"));

pub fn validate_storage_account_name(value: &str, field: &str) -> Vec<String> {
    if STORAGE_ACCOUNT_NAME.is_match(value) {
        return Vec::new();
    }
    vec![format!(
        "{} can only consist of lowercase letters and numbers, and must be between 3 and 24 characters long",
        field
    )]
}

pub fn validate_storage_account_type(value: &str, field: &str) -> Vec<String> {
    let input = value.to_lowercase();
    if STORAGE_ACCOUNT_TYPES
        .iter()
        .any(|valid| valid.to_lowercase() == input)
    {
        return Vec::new();
    }
    vec![format!("Invalid storage account type {:?} for {}", input, field)]
}

pub fn validate_tags(tags: &BTreeMap<String, String>, field: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if tags.len() > MAX_TAGS {
        errors.push(format!(
            "{} can have a maximum of {} tags, got {}",
            field,
            MAX_TAGS,
            tags.len()
        ));
    }

    for (key, value) in tags {
        if key.chars().count() > MAX_TAG_KEY_LEN {
            errors.push(format!(
                "the maximum length for a tag key in {} is {} characters: {:?} is {} characters",
                field,
                MAX_TAG_KEY_LEN,
                key,
                key.chars().count()
            ));
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            errors.push(format!(
                "the maximum length for the value of tag {:?} in {} is {} characters",
                key, field, MAX_TAG_VALUE_LEN
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_storage_account_name() {
        let cases = [
            ("ab", true),
            ("ABC", true),
            ("abc", false),
            ("123456789012345678901234", false),
            ("1234567890123456789012345", true),
            ("abc12345", false),
            ("abc-def", true),
            ("abc\n", true),
        ];

        for (input, should_error) in cases {
            let errors = validate_storage_account_name(input, "name");
            assert_eq!(
                !errors.is_empty(),
                should_error,
                "validating name {:?}: {:?}",
                input,
                errors
            );
        }
    }

    #[test]
    fn test_validate_storage_account_name_lengths() {
        for len in 0..=30 {
            let input = "a".repeat(len);
            let ok = validate_storage_account_name(&input, "name").is_empty();
            assert_eq!(ok, (3..=24).contains(&len), "length {}", len);
        }
    }

    #[test]
    fn test_validate_storage_account_type() {
        let cases = [
            ("standard_lrs", false),
            ("Standard_ZRS", false),
            ("STANDARD_GRS", false),
            ("standard_ragrs", false),
            ("premium_lrs", false),
            ("premium_grs", true),
            ("invalid", true),
            ("", true),
        ];

        for (input, should_error) in cases {
            let errors = validate_storage_account_type(input, "account_type");
            assert_eq!(!errors.is_empty(), should_error, "validating {:?}", input);
        }
    }

    #[test]
    fn test_validate_tags() {
        let mut tags = BTreeMap::new();
        tags.insert("environment".to_string(), "production".to_string());
        assert!(validate_tags(&tags, "tags").is_empty());

        tags.insert("k".repeat(513), "v".to_string());
        tags.insert("long".to_string(), "v".repeat(257));
        assert_eq!(validate_tags(&tags, "tags").len(), 2);
    }

    #[test]
    fn test_validate_too_many_tags() {
        let tags: BTreeMap<String, String> = (0..16)
            .map(|i| (format!("key{}", i), "value".to_string()))
            .collect();

        let errors = validate_tags(&tags, "tags");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("maximum of 15"));
    }
}
