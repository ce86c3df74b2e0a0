//! Diagnostic severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic message.
///
/// Ordered from least severe (`Info`) to most severe (`Fatal`), matching the
/// derived `PartialOrd`/`Ord` implementation based on declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An observation about the input that needs no action.
    Info,
    /// An anomaly that leaves the bitstream interpretable.
    Warning,
    /// A problem that makes the requested operation meaningless.
    Fatal,
}

impl Severity {
    /// Returns `true` if this severity is [`Fatal`](Severity::Fatal).
    pub fn is_fatal(self) -> bool {
        self == Severity::Fatal
    }

    /// Returns the severity after strict-mode promotion.
    ///
    /// Warnings become fatal; info stays informational.
    pub fn promoted(self) -> Self {
        match self {
            Severity::Warning => Severity::Fatal,
            other => other,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}
