//! Course codes, capacities and time slots
//!
//! Course code format: 2-4 uppercase letters, 3 digits, optional suffix
//! letter (e.g. `CS101`, `MATH220A`). Input is upper-cased first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Largest section a course may declare
pub const MAX_CAPACITY: i32 = 1000;

/// Maximum length for time-slot labels
const MAX_TIME_SLOT_LEN: usize = 32;

static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,4}[0-9]{3}[A-Z]?$").expect("invalid course code regex"));

/// Validated course code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(String);

impl CourseCode {
    /// Create a course code, normalizing to uppercase.
    ///
    /// # Example
    /// ```
    /// use regdesk_server::models::CourseCode;
    ///
    /// assert_eq!(CourseCode::new("cs101").unwrap().as_str(), "CS101");
    /// assert!(CourseCode::new("101CS").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let code = s.trim().to_ascii_uppercase();

        if code.is_empty() {
            return Err(ValidationError::Empty {
                field: "course code",
            });
        }

        if !COURSE_CODE_RE.is_match(&code) {
            return Err(ValidationError::InvalidFormat {
                field: "course code",
                reason: "expected 2-4 letters, 3 digits and an optional letter suffix",
            });
        }

        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CourseCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Seat count for a course section.
pub fn validate_capacity(capacity: i32) -> Result<i32, ValidationError> {
    if (1..=MAX_CAPACITY).contains(&capacity) {
        Ok(capacity)
    } else {
        Err(ValidationError::OutOfRange {
            field: "capacity",
            min: 1,
            max: i64::from(MAX_CAPACITY),
        })
    }
}

/// Time-slot label, e.g. `MON 09:00`. Free text, trimmed and bounded.
pub fn validate_time_slot(slot: &str) -> Result<String, ValidationError> {
    super::validation::required_text("time slot", slot, MAX_TIME_SLOT_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codes() {
        assert!(CourseCode::new("CS101").is_ok());
        assert!(CourseCode::new("MATH220A").is_ok());
        assert_eq!(CourseCode::new(" ma201 ").unwrap().as_str(), "MA201");
    }

    #[test]
    fn rejects_bad_codes() {
        assert!(matches!(
            CourseCode::new("C101"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            CourseCode::new("CS10"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            CourseCode::new("CS 101"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            CourseCode::new(""),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn capacity_bounds() {
        assert_eq!(validate_capacity(30), Ok(30));
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(MAX_CAPACITY + 1).is_err());
    }

    #[test]
    fn time_slot_trimmed() {
        assert_eq!(validate_time_slot(" MON 09:00 ").unwrap(), "MON 09:00");
        assert!(validate_time_slot("").is_err());
    }
}
