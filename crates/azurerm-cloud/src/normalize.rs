//! Canonical forms for values the API rewrites
//!
//! State always tracks the form the API returns, so a human-entered value
//! and the value read back never show up as a diff.

use crate::validate::STORAGE_ACCOUNT_TYPES;

/// Normalise a human-readable location (e.g. `"West US"`) to the API form (`"westus"`)
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-fold a storage account type to the spelling the API uses
///
/// Unknown values are returned unchanged; validation rejects them earlier.
pub fn normalize_account_type(account_type: &str) -> String {
    STORAGE_ACCOUNT_TYPES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(account_type))
        .map(|known| known.to_string())
        .unwrap_or_else(|| account_type.to_string())
}

pub fn account_types_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
