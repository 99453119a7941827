//! Custom element name validation.
//!
//! Intentionally ignores the higher Unicode code points the HTML standard
//! also allows in a valid custom element name.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::NameError;

// ═══════════════════════════════════════════════════════════════════════════════
// NAME GRAMMAR
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref VALID_NAME: Regex = Regex::new(r"^[a-z][a-z0-9._]*-[a-z0-9._-]*$").unwrap();
}

/// Hyphenated names that predate custom elements and cannot be defined.
pub const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Asserts that `name` can be used as a custom element name.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(NameError {
            name: name.to_string(),
        })
    }
}

pub fn is_valid_name(name: &str) -> bool {
    VALID_NAME.is_match(name) && !RESERVED_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_hyphenated_lowercase() {
        for name in ["x-foo", "my-element", "a-", "x-1.2_3", "amp-img", "a.b-c_d"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for name in ["foo", "X-foo", "x-Foo", "1-foo", "-foo", "", "x foo-bar", "é-x"] {
            assert_eq!(
                validate_name(name),
                Err(NameError {
                    name: name.to_string()
                }),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_leading_character_sweep() {
        let leads = ('a'..='z').chain('A'..='Z').chain('0'..='9').chain(['-', '.', '_']);
        for lead in leads {
            let hyphenated = format!("{lead}x-el");
            let bare = format!("{lead}xel");
            assert_eq!(
                is_valid_name(&hyphenated),
                lead.is_ascii_lowercase(),
                "{hyphenated}"
            );
            assert!(!is_valid_name(&bare), "{bare} has no hyphen");
        }
    }

    #[test]
    fn test_body_character_sweep() {
        for c in (0u8..=127).map(char::from) {
            let allowed = c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_');
            let before_hyphen = format!("x{c}-el");
            let after_hyphen = format!("x-e{c}");
            assert_eq!(is_valid_name(&before_hyphen), allowed || c == '-', "{before_hyphen:?}");
            assert_eq!(is_valid_name(&after_hyphen), allowed || c == '-', "{after_hyphen:?}");
        }
    }

    #[test]
    fn test_rejects_reserved() {
        for name in RESERVED_NAMES {
            assert!(!is_valid_name(name), "{name} is reserved");
        }
    }
}
