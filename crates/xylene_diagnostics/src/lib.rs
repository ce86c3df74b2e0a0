//! Diagnostic creation, severity management, and rendering.
//!
//! Every anomaly found while decoding or validating a bitstream becomes a
//! [`Diagnostic`] carrying a [`Severity`], a stable [`DiagnosticKind`] (with a
//! displayable [`DiagnosticCode`]), and a [`Location`] pointing at the byte,
//! packet, or frame where it was observed. Diagnostics accumulate in ordered
//! [`Diagnostics`] lists owned by the operation's result, and
//! [`DiagnosticRenderer`] implementations format them for terminals.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod list;
pub mod location;
pub mod renderer;
pub mod severity;

pub use code::{Category, DiagnosticCode, DiagnosticKind};
pub use diagnostic::Diagnostic;
pub use list::Diagnostics;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
