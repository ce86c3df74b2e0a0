//! Structured diagnostic messages with severity, kind, and location.

use crate::code::{DiagnosticCode, DiagnosticKind};
use crate::location::Location;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Each diagnostic includes:
/// - A severity level and the kind of anomaly (with its stable code)
/// - A primary message and the location where it was observed
/// - Optional explanatory notes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// What kind of anomaly this is.
    pub kind: DiagnosticKind,
    /// The main diagnostic message.
    pub message: String,
    /// Where in the input the anomaly was observed.
    pub location: Location,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic with the kind's default severity.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            message: message.into(),
            location,
            notes: Vec::new(),
        }
    }

    /// Returns the stable display code of this diagnostic's kind.
    pub fn code(&self) -> DiagnosticCode {
        self.kind.code()
    }

    /// Overrides the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Returns this diagnostic with strict-mode promotion applied.
    pub fn promoted(mut self) -> Self {
        self.severity = self.severity.promoted();
        self
    }
}
