//! The `MAJOR.MINOR.MAINTENANCE(-TESTTYPE.TESTNUMBER)?` version value type.
//!
//! Ordering deliberately looks only at `(major, minor, maintenance)`. Two
//! identifiers that differ only in their test type or test number compare as
//! equal, so `1.2.0-rc.3` is neither before nor after `1.2.0`. Equality
//! (`==`) distinguishes every field of the string form but ignores the build
//! timestamp, so a stamped version equals its re-parsed string.

use crate::error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(-([^.-]+)\.(\d+))?$").expect("version grammar is a valid regex")
});

static TEST_TYPE_GRAMMAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^.\-/'\s]+$").expect("test type grammar is a valid regex"));

/// Immutable simulation version.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "VersionRecord", into = "VersionRecord")]
pub struct VersionIdentifier {
    major: u32,
    minor: u32,
    maintenance: u32,
    test_type: Option<String>,
    test_number: Option<u32>,
    build_timestamp: Option<String>,
}

impl VersionIdentifier {
    /// Create a version, validating the test type / test number pairing.
    pub fn new(
        major: u32,
        minor: u32,
        maintenance: u32,
        test_type: Option<&str>,
        test_number: Option<u32>,
    ) -> Result<Self, ValidationError> {
        match (test_type, test_number) {
            (Some(test_type), Some(_)) => validate_test_type(test_type)?,
            (Some(_), None) => {
                return Err(ValidationError::InvalidField {
                    field: "testNumber",
                    reason: "must be present when testType is set".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(ValidationError::InvalidField {
                    field: "testNumber",
                    reason: "must be absent when testType is not set".to_string(),
                });
            }
            (None, None) => {}
        }

        Ok(Self {
            major,
            minor,
            maintenance,
            test_type: test_type.map(str::to_string),
            test_number,
            build_timestamp: None,
        })
    }

    /// A version without test type, e.g. `1.2.0`.
    pub fn release(major: u32, minor: u32, maintenance: u32) -> Self {
        Self {
            major,
            minor,
            maintenance,
            test_type: None,
            test_number: None,
            build_timestamp: None,
        }
    }

    /// Parse the stored string form.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let captures = VERSION_GRAMMAR
            .captures(text)
            .ok_or_else(|| ValidationError::Parse {
                text: text.to_string(),
            })?;

        let number = |index: usize, field: &'static str| -> Result<u32, ValidationError> {
            coerce_number(field, &captures[index])
        };

        let major = number(1, "major")?;
        let minor = number(2, "minor")?;
        let maintenance = number(3, "maintenance")?;

        match (captures.get(5), captures.get(6)) {
            (Some(test_type), Some(test_number)) => Self::new(
                major,
                minor,
                maintenance,
                Some(test_type.as_str()),
                Some(coerce_number("testNumber", test_number.as_str())?),
            ),
            _ => Ok(Self::release(major, minor, maintenance)),
        }
    }

    /// Version implied by a `MAJOR.MINOR` release branch name (maintenance 0).
    pub fn from_branch(branch: &str) -> Result<Self, ValidationError> {
        let parts: Vec<&str> = branch.split('.').collect();
        if parts.len() != 2 {
            return Err(ValidationError::InvalidBranch {
                branch: branch.to_string(),
                reason: format!("expected 2 dot-separated components, found {}", parts.len()),
            });
        }

        let component = |text: &str, field: &'static str| {
            coerce_number(field, text).map_err(|e| ValidationError::InvalidBranch {
                branch: branch.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(Self::release(
            component(parts[0], "major")?,
            component(parts[1], "minor")?,
            0,
        ))
    }

    /// Major component
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor component
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Maintenance component
    pub fn maintenance(&self) -> u32 {
        self.maintenance
    }

    /// Test type (`dev`, `rc`, or a one-off branch name)
    pub fn test_type(&self) -> Option<&str> {
        self.test_type.as_deref()
    }

    /// Test number, present exactly when a test type is set
    pub fn test_number(&self) -> Option<u32> {
        self.test_number
    }

    /// Timestamp stamped on the version at build time
    pub fn build_timestamp(&self) -> Option<&str> {
        self.build_timestamp.as_deref()
    }

    /// Copy of this version carrying a build timestamp.
    pub fn with_build_timestamp(&self, timestamp: impl Into<String>) -> Self {
        Self {
            build_timestamp: Some(timestamp.into()),
            ..self.clone()
        }
    }

    /// Release branch this version belongs to, `"{major}.{minor}"`.
    pub fn branch_name(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Whether this version has been (or would be) published.
    pub fn is_published(&self) -> bool {
        if self.major < 1 {
            return false;
        }
        !(self.major == 1
            && self.minor == 0
            && self.maintenance == 0
            && self.test_type.is_some())
    }

    /// Lexicographic comparison over `(major, minor, maintenance)` only.
    pub fn compare(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.maintenance).cmp(&(
            other.major,
            other.minor,
            other.maintenance,
        ))
    }

    /// Strictly after `other` in release order
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Before or at the same release position as `other`
    pub fn is_before_or_equal_to(&self, other: &Self) -> bool {
        self.compare(other) != Ordering::Greater
    }

    /// Plain record form
    pub fn serialize(&self) -> VersionRecord {
        VersionRecord::from(self.clone())
    }

    /// Rebuild from a plain record, re-validating every invariant.
    pub fn deserialize(record: VersionRecord) -> Result<Self, ValidationError> {
        Self::try_from(record)
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.maintenance)?;
        if let (Some(test_type), Some(test_number)) = (&self.test_type, self.test_number) {
            write!(f, "-{}.{}", test_type, test_number)?;
        }
        Ok(())
    }
}

impl VersionIdentifier {
    fn key(&self) -> (u32, u32, u32, Option<&str>, Option<u32>) {
        (
            self.major,
            self.minor,
            self.maintenance,
            self.test_type.as_deref(),
            self.test_number,
        )
    }
}

impl PartialEq for VersionIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Hash for VersionIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl FromStr for VersionIdentifier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Serialized form of a [`VersionIdentifier`].
///
/// Numeric fields accept either JSON numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// Major component
    pub major: NumericField,
    /// Minor component
    pub minor: NumericField,
    /// Maintenance component
    pub maintenance: NumericField,
    /// Test type
    #[serde(default)]
    pub test_type: Option<String>,
    /// Test number
    #[serde(default)]
    pub test_number: Option<NumericField>,
    /// Build timestamp
    #[serde(default)]
    pub build_timestamp: Option<String>,
}

/// A number that may arrive as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    /// JSON number
    Number(u64),
    /// Numeric string
    Text(String),
}

impl NumericField {
    fn coerce(&self, field: &'static str) -> Result<u32, ValidationError> {
        match self {
            NumericField::Number(n) => u32::try_from(*n).map_err(|_| ValidationError::InvalidField {
                field,
                reason: format!("{} is out of range", n),
            }),
            NumericField::Text(text) => coerce_number(field, text.trim()),
        }
    }
}

impl From<u32> for NumericField {
    fn from(value: u32) -> Self {
        NumericField::Number(u64::from(value))
    }
}

impl From<&str> for NumericField {
    fn from(value: &str) -> Self {
        NumericField::Text(value.to_string())
    }
}

impl From<VersionIdentifier> for VersionRecord {
    fn from(version: VersionIdentifier) -> Self {
        Self {
            major: version.major.into(),
            minor: version.minor.into(),
            maintenance: version.maintenance.into(),
            test_type: version.test_type,
            test_number: version.test_number.map(NumericField::from),
            build_timestamp: version.build_timestamp,
        }
    }
}

impl TryFrom<VersionRecord> for VersionIdentifier {
    type Error = ValidationError;

    fn try_from(record: VersionRecord) -> Result<Self, Self::Error> {
        let test_number = record
            .test_number
            .as_ref()
            .map(|n| n.coerce("testNumber"))
            .transpose()?;

        let mut version = Self::new(
            record.major.coerce("major")?,
            record.minor.coerce("minor")?,
            record.maintenance.coerce("maintenance")?,
            record.test_type.as_deref(),
            test_number,
        )?;
        version.build_timestamp = record.build_timestamp;
        Ok(version)
    }
}

fn coerce_number(field: &'static str, text: &str) -> Result<u32, ValidationError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("'{}' is not a non-negative integer", text),
        });
    }
    text.parse::<u32>().map_err(|_| ValidationError::InvalidField {
        field,
        reason: format!("{} is out of range", text),
    })
}

fn validate_test_type(test_type: &str) -> Result<(), ValidationError> {
    if TEST_TYPE_GRAMMAR.is_match(test_type) {
        Ok(())
    } else {
        Err(ValidationError::InvalidField {
            field: "testType",
            reason: format!(
                "'{}' must be non-empty and contain no '.', '-', '/', quote or whitespace",
                test_type
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> VersionIdentifier {
        VersionIdentifier::parse(text).unwrap()
    }

    #[test]
    fn parses_release_candidate() {
        let version = v("1.2.3-rc.1");
        assert_eq!(version.major(), 1);
        assert_eq!(version.minor(), 2);
        assert_eq!(version.maintenance(), 3);
        assert_eq!(version.test_type(), Some("rc"));
        assert_eq!(version.test_number(), Some(1));
        assert_eq!(version.to_string(), "1.2.3-rc.1");
    }

    #[test]
    fn rejects_malformed_strings() {
        for text in ["1.2", "1.2.3-rc", "1.2.3-rc.x", "a.b.c", "1.2.3-r.c.1", " 1.2.3", "1.2.3-"] {
            assert!(
                matches!(VersionIdentifier::parse(text), Err(ValidationError::Parse { .. })),
                "{text} should not parse"
            );
        }
    }

    #[test]
    fn string_form_round_trips() {
        for text in ["0.0.0", "1.5.6", "12.0.3-dev.40", "2.1.0-myOneOff.0"] {
            assert_eq!(v(text).to_string(), text);
        }
    }

    #[test]
    fn ordering_ignores_test_fields() {
        assert_eq!(v("1.2.0-rc.1").compare(&v("1.2.0-dev.9")), Ordering::Equal);
        assert_eq!(v("1.2.0-rc.1").compare(&v("1.2.0")), Ordering::Equal);
        assert_ne!(v("1.2.0-rc.1"), v("1.2.0-dev.9"));
        assert!(v("1.5.6").is_before_or_equal_to(&v("2.2.2")));
        assert!(v("3.0.0").is_after(&v("2.2.2")));
        assert!(v("2.2.2-rc.1").is_before_or_equal_to(&v("2.2.2")));
    }

    #[test]
    fn test_number_requires_test_type() {
        assert!(matches!(
            VersionIdentifier::new(1, 0, 0, Some("rc"), None),
            Err(ValidationError::InvalidField { field: "testNumber", .. })
        ));
        assert!(matches!(
            VersionIdentifier::new(1, 0, 0, None, Some(3)),
            Err(ValidationError::InvalidField { field: "testNumber", .. })
        ));
        assert!(matches!(
            VersionIdentifier::new(1, 0, 0, Some("has-dash"), Some(0)),
            Err(ValidationError::InvalidField { field: "testType", .. })
        ));
    }

    #[test]
    fn record_coerces_numeric_strings() {
        let record = VersionRecord {
            major: "2".into(),
            minor: 1u32.into(),
            maintenance: "0".into(),
            test_type: Some("dev".to_string()),
            test_number: Some("7".into()),
            build_timestamp: Some("2024-01-01 00:00:00 UTC".to_string()),
        };
        let version = VersionIdentifier::deserialize(record).unwrap();
        assert_eq!(version.to_string(), "2.1.0-dev.7");
        assert_eq!(version.build_timestamp(), Some("2024-01-01 00:00:00 UTC"));

        let bad = VersionRecord {
            major: "two".into(),
            ..version.serialize()
        };
        assert!(matches!(
            VersionIdentifier::deserialize(bad),
            Err(ValidationError::InvalidField { field: "major", .. })
        ));
    }

    #[test]
    fn serde_uses_camel_case_record() {
        let version = v("1.3.0-rc.0").with_build_timestamp("now");
        let json = serde_json::to_value(&version).unwrap();
        assert_eq!(json["testType"], "rc");
        assert_eq!(json["testNumber"], 0);
        assert_eq!(json["buildTimestamp"], "now");

        let back: VersionIdentifier = serde_json::from_value(json).unwrap();
        assert_eq!(back, version);
    }

    #[test]
    fn published_rules() {
        assert!(!v("0.0.0-dev.1").is_published());
        assert!(!v("1.0.0-dev.1").is_published());
        assert!(v("1.0.1").is_published());
        assert!(v("1.0.0").is_published());
        assert!(v("2.0.0-dev.1").is_published());
    }

    #[test]
    fn test_types_stay_path_and_shell_safe() {
        for name in ["a/b", "it's", "two words", "tab\there", ""] {
            assert!(
                matches!(
                    VersionIdentifier::new(1, 0, 0, Some(name), Some(0)),
                    Err(ValidationError::InvalidField { field: "testType", .. })
                ),
                "{name:?} should be rejected"
            );
        }
        assert!(VersionIdentifier::parse("1.2.0-x';reboot;'.0").is_err());
        assert!(VersionIdentifier::new(1, 0, 0, Some("sonification_2"), Some(0)).is_ok());
    }

    #[test]
    fn equality_ignores_build_timestamp() {
        use std::collections::HashSet;

        let stamped = v("1.3.0-rc.2").with_build_timestamp("2024-05-01 12:00:00 UTC");
        let reparsed = v(&stamped.to_string());
        assert_eq!(reparsed, stamped);
        assert_ne!(stamped, v("1.3.0-rc.3"));

        let set: HashSet<_> = [stamped, reparsed].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
