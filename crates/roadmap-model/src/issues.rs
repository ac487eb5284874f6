//! Structured multi-error reporting
//!
//! Validation never stops at the first problem. Every check appends an
//! [`Issue`] and the caller receives the complete list.

use std::fmt::{self, Display, Formatter};

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// What the finding is about, e.g. `feature 2` or `action 2.01`
    pub subject: String,
    /// What is wrong with it
    pub message: String,
}

impl Issue {
    /// Create new issue
    #[inline]
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Ordered collection of findings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Issues(Vec<Issue>);

impl Issues {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding
    #[inline]
    pub fn push(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.0.push(Issue::new(subject, message));
    }

    /// Append all findings from `other`
    #[inline]
    pub fn extend(&mut self, other: Issues) {
        self.0.extend(other.0);
    }

    /// Whether nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of findings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate findings in recording order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    ///
    /// # Errors
    /// Returns the collection itself when it holds any finding
    #[inline]
    pub fn into_result(self) -> Result<(), Issues> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Whether any finding's message contains `needle`
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.0
            .iter()
            .any(|issue| issue.message.contains(needle) || issue.subject.contains(needle))
    }
}

impl From<Vec<Issue>> for Issues {
    fn from(value: Vec<Issue>) -> Self {
        Self(value)
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Issues {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "issue" } else { "issues" };
        write!(f, "{} {noun}", self.0.len())?;
        for (i, issue) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Issues {}
