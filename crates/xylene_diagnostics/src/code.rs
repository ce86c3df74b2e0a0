//! Diagnostic kinds and their stable display codes.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Packet-stream structure, prefixed with `S`.
    Stream,
    /// Frame addressing and materialization, prefixed with `F`.
    Frame,
    /// Checksum verification, prefixed with `C`.
    Checksum,
    /// Part identification, prefixed with `P`.
    Part,
    /// Frame coverage of the reconfiguration scope, prefixed with `V`.
    Coverage,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Stream => 'S',
            Category::Frame => 'F',
            Category::Checksum => 'C',
            Category::Part => 'P',
            Category::Coverage => 'V',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `C301`, `F201`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Every anomaly the decoder and validator can report.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Non-padding bytes follow the DESYNC command.
    TrailingData,
    /// The packet stream ended without a DESYNC command.
    MissingDesync,
    /// The header's declared data length disagrees with the input size.
    LengthMismatch,
    /// A write targeted a register outside the known register file.
    UnknownRegister,
    /// A write targeted a read-only register (FDRO, STAT, BOOTSTS).
    ReadOnlyRegister,
    /// Frame data arrived without the command that enables it.
    MissingWriteCommand,
    /// A frame address outside the part's range, or out of order.
    FrameOutOfRange,
    /// A frame was written more than once.
    FrameRewritten,
    /// The stream ended in the middle of a frame.
    PartialFrame,
    /// No frame length was known, so frames follow packet boundaries.
    UnknownFrameLength,
    /// A stated CRC does not match the computed one.
    ChecksumMismatch,
    /// The stream carries no CRC check at all.
    MissingChecksum,
    /// The IDCODE matches no part (or not the part supplied).
    UnknownPart,
    /// The stream never writes the IDCODE register.
    MissingIdcode,
    /// The IDCODE register is written with two different values.
    IdcodeConflict,
    /// The header part string does not name the bound part.
    HeaderPartMismatch,
    /// Frames missing from the declared reconfiguration scope.
    CoverageGap,
}

impl DiagnosticKind {
    /// Returns the stable display code for this kind.
    pub fn code(self) -> DiagnosticCode {
        let (category, number) = match self {
            DiagnosticKind::TrailingData => (Category::Stream, 101),
            DiagnosticKind::MissingDesync => (Category::Stream, 102),
            DiagnosticKind::LengthMismatch => (Category::Stream, 103),
            DiagnosticKind::UnknownRegister => (Category::Stream, 104),
            DiagnosticKind::MissingWriteCommand => (Category::Stream, 105),
            DiagnosticKind::ReadOnlyRegister => (Category::Stream, 106),
            DiagnosticKind::FrameOutOfRange => (Category::Frame, 201),
            DiagnosticKind::FrameRewritten => (Category::Frame, 202),
            DiagnosticKind::PartialFrame => (Category::Frame, 203),
            DiagnosticKind::UnknownFrameLength => (Category::Frame, 204),
            DiagnosticKind::ChecksumMismatch => (Category::Checksum, 301),
            DiagnosticKind::MissingChecksum => (Category::Checksum, 302),
            DiagnosticKind::UnknownPart => (Category::Part, 401),
            DiagnosticKind::MissingIdcode => (Category::Part, 402),
            DiagnosticKind::IdcodeConflict => (Category::Part, 403),
            DiagnosticKind::HeaderPartMismatch => (Category::Part, 404),
            DiagnosticKind::CoverageGap => (Category::Coverage, 501),
        };
        DiagnosticCode::new(category, number)
    }

    /// Returns the severity this kind carries outside strict mode.
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::TrailingData
            | DiagnosticKind::FrameRewritten
            | DiagnosticKind::UnknownFrameLength
            | DiagnosticKind::MissingChecksum
            | DiagnosticKind::HeaderPartMismatch => Severity::Info,
            DiagnosticKind::UnknownPart => Severity::Fatal,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
