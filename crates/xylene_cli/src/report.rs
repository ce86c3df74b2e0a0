//! Rendering of diagnostics and command results.

use std::error::Error;

use serde::Serialize;
use xylene_diagnostics::{DiagnosticRenderer, Diagnostics, Severity, TerminalRenderer};

use crate::GlobalArgs;

/// Renders diagnostics for one input to stderr.
pub fn render_diagnostics(diags: &Diagnostics, origin: &str, global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    for diag in diags {
        if global.quiet && diag.severity != Severity::Fatal {
            continue;
        }
        eprint!("{}", renderer.render(diag, origin));
    }
}

/// Prints the fatal and warning counts unless quiet.
pub fn print_summary<'a>(lists: impl IntoIterator<Item = &'a Diagnostics>, global: &GlobalArgs) {
    if global.quiet {
        return;
    }
    let (mut fatal, mut warnings) = (0, 0);
    for diags in lists {
        fatal += diags.count(Severity::Fatal);
        warnings += diags.count(Severity::Warning);
    }
    eprintln!("   Result: {fatal} fatal, {warnings} warning(s)");
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats a bit value, marking bits whose frame is absent.
pub fn bit_text(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "1",
        Some(false) => "0",
        None => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_text_marks_absent_bits() {
        assert_eq!(bit_text(Some(true)), "1");
        assert_eq!(bit_text(Some(false)), "0");
        assert_eq!(bit_text(None), "?");
    }
}
