//! DNS label checks for service names (RFC 1035) and namespaces (RFC 1123)
//!
//! Both checks report every rule a value breaks rather than stopping at the
//! first one.

use std::fmt;

/// Maximum length of a single DNS label.
pub const LABEL_MAX_LENGTH: usize = 63;

/// A single rule broken by a candidate label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelViolation {
    Empty,
    TooLong { length: usize },
    InvalidCharacters,
    MustStartWithLetter,
    MustStartWithAlphanumeric,
    MustEndWithAlphanumeric,
}

impl fmt::Display for LabelViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "must not be empty"),
            Self::TooLong { length } => write!(
                f,
                "must be no more than {LABEL_MAX_LENGTH} characters (got {length})"
            ),
            Self::InvalidCharacters => {
                write!(f, "must consist of lower case alphanumeric characters or '-'")
            }
            Self::MustStartWithLetter => {
                write!(f, "must start with a lower case alphabetic character")
            }
            Self::MustStartWithAlphanumeric => {
                write!(f, "must start with a lower case alphanumeric character")
            }
            Self::MustEndWithAlphanumeric => {
                write!(f, "must end with a lower case alphanumeric character")
            }
        }
    }
}

/// Checks `value` against the DNS-1035 label rules used for service names.
pub fn dns1035_label_violations(value: &str) -> Vec<LabelViolation> {
    label_violations(
        value,
        |c| c.is_ascii_lowercase(),
        LabelViolation::MustStartWithLetter,
    )
}

/// Checks `value` against the DNS-1123 label rules used for namespaces.
pub fn dns1123_label_violations(value: &str) -> Vec<LabelViolation> {
    label_violations(
        value,
        is_lower_alphanumeric,
        LabelViolation::MustStartWithAlphanumeric,
    )
}

fn label_violations(
    value: &str,
    valid_first: fn(char) -> bool,
    first_violation: LabelViolation,
) -> Vec<LabelViolation> {
    let (Some(first), Some(last)) = (value.chars().next(), value.chars().last()) else {
        return vec![LabelViolation::Empty];
    };

    let mut violations = Vec::new();
    if value.len() > LABEL_MAX_LENGTH {
        violations.push(LabelViolation::TooLong {
            length: value.len(),
        });
    }
    if !value.chars().all(|c| is_lower_alphanumeric(c) || c == '-') {
        violations.push(LabelViolation::InvalidCharacters);
    }
    if !valid_first(first) {
        violations.push(first_violation);
    }
    if !is_lower_alphanumeric(last) {
        violations.push(LabelViolation::MustEndWithAlphanumeric);
    }
    violations
}

fn is_lower_alphanumeric(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}
