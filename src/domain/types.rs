//! Validated domain types
//!
//! Newtypes for the names, horizons and levels that cross the request
//! boundary, so that invalid values are rejected where they enter.

use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for any horizon a caller may request (three years of days)
pub const MAX_HORIZON_DAYS: u32 = 1095;

/// County name as it appears in the source tables ("Admin2")
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct CountyName(String);

/// State name as it appears in the source tables ("Province_State")
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct StateName(String);

/// A number of days, used for both the held-out test horizon and the
/// forecast horizon
#[nutype(
    validate(less_or_equal = 1095),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        Display
    )
)]
pub struct HorizonDays(u32);

impl HorizonDays {
    pub fn days(&self) -> usize {
        self.into_inner() as usize
    }
}

/// Width of the prediction interval, strictly between 0 and 1
#[nutype(
    validate(finite, greater = 0.0, less = 1.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Display)
)]
pub struct ConfidenceLevel(f64);

/// A selection value that does not name any known option
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognised {field} '{value}'")]
pub struct UnknownOption {
    pub field: &'static str,
    pub value: String,
}

impl UnknownOption {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Normalise a UI selection string for case- and separator-insensitive matching
pub(crate) fn normalise_selection(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_trimmed_and_non_empty() {
        let county = CountyName::try_new("  Los Angeles ").unwrap();
        assert_eq!(county.as_ref(), "Los Angeles");
        assert!(CountyName::try_new("   ").is_err());
        assert!(StateName::try_new("").is_err());
    }

    #[test]
    fn test_horizon_bounds() {
        assert!(HorizonDays::try_new(0).is_ok());
        assert!(HorizonDays::try_new(MAX_HORIZON_DAYS).is_ok());
        assert!(HorizonDays::try_new(MAX_HORIZON_DAYS + 1).is_err());
        assert_eq!(HorizonDays::try_new(30).unwrap().days(), 30);
    }

    #[test]
    fn test_confidence_level_is_open_interval() {
        assert!(ConfidenceLevel::try_new(0.8).is_ok());
        assert!(ConfidenceLevel::try_new(0.0).is_err());
        assert!(ConfidenceLevel::try_new(1.0).is_err());
        assert!(ConfidenceLevel::try_new(f64::NAN).is_err());
    }

    #[test]
    fn test_normalise_selection() {
        assert_eq!(
            normalise_selection(" Daily Rolling Average"),
            "dailyrollingaverage"
        );
        assert_eq!(
            normalise_selection("daily_rolling_average"),
            "dailyrollingaverage"
        );
    }
}
