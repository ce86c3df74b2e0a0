//! Ordered diagnostic lists owned by decode and validation results.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// An ordered accumulator of diagnostics.
///
/// Order is the order of observation, so two runs over the same input
/// produce identical lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        self.items.push(diag);
    }

    /// Appends every diagnostic from another list, preserving order.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(other);
    }

    /// Returns `true` if any fatal diagnostic has been recorded.
    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(|d| d.severity.is_fatal())
    }

    /// Returns the number of diagnostics with exactly the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    /// Returns the first diagnostic at or above the given severity.
    pub fn first_at_least(&self, severity: Severity) -> Option<&Diagnostic> {
        self.items.iter().find(|d| d.severity >= severity)
    }

    /// Returns the list with every warning promoted to fatal.
    pub fn promoted(self) -> Self {
        Self {
            items: self.items.into_iter().map(Diagnostic::promoted).collect(),
        }
    }

    /// Consumes the list, returning the underlying vector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Deref for Diagnostics {
    type Target = [Diagnostic];

    fn deref(&self) -> &[Diagnostic] {
        &self.items
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(items: Vec<Diagnostic>) -> Self {
        Self { items }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
