//! Feature and action identifiers
//!
//! Identifiers are canonical digit strings: `"1"` for a feature, `"1.01"` for
//! an action under it. Ordering is numeric, never lexicographic, so `"2"`
//! sorts before `"10"` and `"1.09"` before `"1.10"`.

use crate::error::{IdKind, ModelError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

// ASCII classes on purpose: `\d` would also accept non-ASCII digits.
static FEATURE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("feature number pattern is valid"));
static ACTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]{2}$").expect("action number pattern is valid"));

/// Strip leading zeros, keeping a single `0` for all-zero input
fn canonical_digits(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() && !digits.is_empty() {
        &digits[digits.len() - 1..]
    } else {
        trimmed
    }
}

/// Compare two ASCII digit strings by integer value without parsing
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let (a, b) = (canonical_digits(a), canonical_digits(b));
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Feature identifier, e.g. `"1"` or `"12"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureNumber(String);

impl FeatureNumber {
    /// Parse and validate a feature number
    ///
    /// # Errors
    /// `ModelError::InvalidFormat` unless the input matches `^[0-9]+$`
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        if FEATURE_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ModelError::invalid_format(IdKind::Feature, value))
        }
    }

    /// Identifier as written
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value as a digit string without leading zeros
    #[inline]
    #[must_use]
    pub fn numeric_key(&self) -> &str {
        canonical_digits(&self.0)
    }

    /// Whether both identifiers denote the same integer (`"1"` and `"01"`)
    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.numeric_key() == other.numeric_key()
    }
}

impl Ord for FeatureNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_digits(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for FeatureNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for FeatureNumber {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FeatureNumber {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if FEATURE_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::invalid_format(IdKind::Feature, value))
        }
    }
}

impl From<FeatureNumber> for String {
    fn from(value: FeatureNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for FeatureNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for FeatureNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Action identifier, e.g. `"1.01"`
///
/// The part before the dot names the owning feature; the two digits after it
/// order actions within that feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionNumber(String);

impl ActionNumber {
    /// Parse and validate an action number
    ///
    /// # Errors
    /// `ModelError::InvalidFormat` unless the input matches `^[0-9]+\.[0-9]{2}$`
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        if ACTION_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ModelError::invalid_format(IdKind::Action, value))
        }
    }

    /// Build the `seq`-th action number of a feature (`1` + `3` → `"1.03"`)
    ///
    /// # Errors
    /// `ModelError::InvalidFormat` if `seq` needs more than two digits
    pub fn compose(feature: &FeatureNumber, seq: u32) -> Result<Self, ModelError> {
        Self::parse(&format!("{feature}.{seq:02}"))
    }

    /// Identifier as written
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        // The grammar guarantees exactly one dot.
        self.0.split_once('.').unwrap_or((&self.0, ""))
    }

    /// Digits before the dot
    #[inline]
    #[must_use]
    pub fn feature_part(&self) -> &str {
        self.split().0
    }

    /// Owning feature number implied by the prefix
    #[must_use]
    pub fn feature_number(&self) -> FeatureNumber {
        FeatureNumber(self.feature_part().to_string())
    }

    /// Whether the prefix denotes `feature`
    #[inline]
    #[must_use]
    pub fn belongs_to(&self, feature: &FeatureNumber) -> bool {
        canonical_digits(self.feature_part()) == feature.numeric_key()
    }

    /// Numeric identity: canonical feature digits and the two-digit suffix
    #[inline]
    #[must_use]
    pub fn numeric_key(&self) -> (&str, &str) {
        let (major, minor) = self.split();
        (canonical_digits(major), minor)
    }
}

impl Ord for ActionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_major, a_minor) = self.split();
        let (b_major, b_minor) = other.split();
        cmp_digits(a_major, b_major)
            .then_with(|| a_minor.cmp(b_minor))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ActionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ActionNumber {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ActionNumber {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if ACTION_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::invalid_format(IdKind::Action, value))
        }
    }
}

impl From<ActionNumber> for String {
    fn from(value: ActionNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for ActionNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ActionNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a raw feature number
///
/// # Errors
/// `ModelError::InvalidFormat` unless `value` matches `^[0-9]+$`
#[inline]
pub fn validate_feature_number(value: &str) -> Result<(), ModelError> {
    FeatureNumber::parse(value).map(|_| ())
}

/// Check a raw action number
///
/// # Errors
/// `ModelError::InvalidFormat` unless `value` matches `^[0-9]+\.[0-9]{2}$`
#[inline]
pub fn validate_action_number(value: &str) -> Result<(), ModelError> {
    ActionNumber::parse(value).map(|_| ())
}
