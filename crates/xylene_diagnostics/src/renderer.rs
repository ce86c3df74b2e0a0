//! Diagnostic rendering backends for human-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic observed in the input named `origin`.
    fn render(&self, diag: &Diagnostic, origin: &str) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[C301]: stated CRC 0x00000001 does not match computed 0x9A3C51E2
///   --> design.bit: packet 14, byte 0x1F4
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Info => "36",
            Severity::Warning => "33",
            Severity::Fatal => "31",
        };
        format!("\x1b[1;{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, origin: &str) -> String {
        let mut out = String::new();

        let head = format!("{}[{}]", diag.severity, diag.code());
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(diag.severity, &head),
            diag.message
        ));

        if diag.location.is_none() {
            out.push_str(&format!("  --> {origin}\n"));
        } else {
            out.push_str(&format!("  --> {origin}: {}\n", diag.location));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        out
    }
}
