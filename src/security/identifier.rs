//! Identifier Validator - Whitelist validation for owner and repository names
//!
//! Owner and repository names end up interpolated into filesystem paths and
//! HTTPS URLs. The accepted alphabet is deliberately narrower than what hosting
//! platforms allow.
//!
//! # Example
//!
//! ```
//! use repo_guard::security::identifier::{validate, Identifier};
//!
//! assert!(validate("my-org.name"));
//! assert!(!validate("../evil"));
//!
//! let owner = Identifier::parse("octo-org").unwrap();
//! assert_eq!(owner.as_str(), "octo-org");
//! ```

use crate::core::error::GuardError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;

/// Maximum identifier length in characters
pub const MAX_IDENTIFIER_LENGTH: usize = 100;

/// Returns true if `value` is a safe owner or repository name.
pub fn validate(value: &str) -> bool {
    check(value).is_ok()
}

/// The rule an identifier failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Violation {
    Empty,
    TooLong,
    ParentSequence,
    Separator,
    Disallowed(char),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Empty => write!(f, "empty"),
            Violation::TooLong => write!(f, "longer than {} characters", MAX_IDENTIFIER_LENGTH),
            Violation::ParentSequence => write!(f, "parent directory sequence"),
            Violation::Separator => write!(f, "path separator"),
            Violation::Disallowed(c) => write!(f, "disallowed character {:?}", c),
        }
    }
}

/// Runs the identifier rules in order and reports the first one that fails.
fn check(value: &str) -> Result<(), Violation> {
    if value.is_empty() {
        return Err(Violation::Empty);
    }

    if value.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(Violation::TooLong);
    }

    if value.contains("..") {
        return Err(Violation::ParentSequence);
    }

    if value.contains('/') || value.contains('\\') {
        return Err(Violation::Separator);
    }

    match value.chars().find(|c| !is_allowed_char(*c)) {
        Some(c) => Err(Violation::Disallowed(c)),
        None => Ok(()),
    }
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// A validated owner or repository name
///
/// Holding an `Identifier` means the value passed [`validate`], so it contains
/// no path separator and no `..`, and can be used as a single path segment or
/// URL path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate `value` and wrap it
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidIdentifier` naming the rule that failed.
    ///
    /// # Examples
    ///
    /// ```
    /// use repo_guard::security::identifier::Identifier;
    ///
    /// assert!(Identifier::parse("repo_name-2").is_ok());
    /// assert!(Identifier::parse("a/b").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, GuardError> {
        check(value)
            .map(|()| Self(value.to_string()))
            .map_err(|violation| GuardError::InvalidIdentifier {
                value: value.to_string(),
                reason: violation.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for Identifier {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for Identifier {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = GuardError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_plain_names() {
        assert!(validate("my-org.name"));
        assert!(validate("repo_name"));
        assert!(validate("A1"));
        assert!(validate("."));
        assert!(validate("-leading-hyphen"));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(!validate(""));
    }

    #[test]
    fn test_length_boundary() {
        assert!(validate(&"a".repeat(100)));
        assert!(!validate(&"a".repeat(101)));
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(!validate("../evil"));
        assert!(!validate(".."));
        assert!(!validate("a..b"));
    }

    #[test]
    fn test_rejects_separators() {
        assert!(!validate("org/repo"));
        assert!(!validate("org\\repo"));
        assert!(!validate("/"));
    }

    #[test]
    fn test_rejects_shell_and_url_metacharacters() {
        for value in ["a b", "a;b", "a$b", "a`b", "a@b", "a:b", "a?b", "a#b", "a%2e"] {
            assert!(!validate(value), "{value:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_non_ascii() {
        assert!(!validate("café"));
        assert!(!validate("repo\u{0}"));
        assert!(!validate("repo\n"));
    }

    #[test]
    fn test_parse_reports_reason() {
        let err = Identifier::parse("../evil").unwrap_err();
        assert_eq!(
            err,
            GuardError::InvalidIdentifier {
                value: "../evil".to_string(),
                reason: "parent directory sequence".to_string(),
            }
        );

        let err = Identifier::parse("a b").unwrap_err();
        assert!(err.to_string().contains("disallowed character ' '"));
    }

    #[test]
    fn test_identifier_conversions() {
        let id: Identifier = "octo".parse().unwrap();
        assert_eq!(id.to_string(), "octo");
        assert_eq!(&*id, "octo");
        assert_eq!(AsRef::<Path>::as_ref(&id), Path::new("octo"));
        assert!(Identifier::try_from("bad/name").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Identifier = serde_json::from_str("\"octo\"").unwrap();
        assert_eq!(ok.as_str(), "octo");

        let bad: Result<Identifier, _> = serde_json::from_str("\"../etc\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_whitelisted_names_are_accepted(s in "[A-Za-z0-9._-]{1,100}") {
            prop_assume!(!s.contains(".."));
            prop_assert!(validate(&s));
        }

        #[test]
        fn prop_separators_are_rejected(
            prefix in "[A-Za-z0-9_-]{0,20}",
            sep in prop::sample::select(vec!["/", "\\", ".."]),
            suffix in "[A-Za-z0-9_-]{0,20}",
        ) {
            let s = format!("{prefix}{sep}{suffix}");
            prop_assert!(!validate(&s));
        }

        #[test]
        fn prop_overlong_names_are_rejected(s in "[a-z]{101,200}") {
            prop_assert!(!validate(&s));
        }
    }
}
