//! Re-validation of decoded containers against a part.
//!
//! Validation never re-parses the input: it works from the packets and frames
//! the container already holds, so it can be rerun with a different part or
//! policy. Its findings are independent of the decode-time diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use xylene_bitstream::{checksum_checks, BitstreamContainer};
use xylene_common::FrameAddress;
use xylene_database::{Database, PartDescriptor, Segment};
use xylene_diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};

/// Which frames a bitstream is expected to write completely.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconfigScope {
    /// Every column segment the bitstream touches.
    #[default]
    Columns,
    /// Every frame of the part.
    Device,
}

impl fmt::Display for ReconfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconfigScope::Columns => f.write_str("columns"),
            ReconfigScope::Device => f.write_str("device"),
        }
    }
}

/// How validation findings are judged.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Promote warnings to fatal.
    pub strict: bool,
    /// Coverage expectation.
    pub scope: ReconfigScope,
}

impl ValidationPolicy {
    /// Sets strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the coverage scope.
    pub fn with_scope(mut self, scope: ReconfigScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Validates a container against `part`.
///
/// Checks run in order: checksums, frame range, coverage, then identity.
/// Without a part only the checksum and identity checks run.
pub fn validate(
    container: &BitstreamContainer,
    part: Option<&PartDescriptor>,
    policy: &ValidationPolicy,
) -> Diagnostics {
    let mut diags = Diagnostics::new();
    check_checksums(container, &mut diags);
    if let Some(part) = part {
        check_range(container, part, &mut diags);
        check_coverage(container, part, policy.scope, &mut diags);
    }
    check_identity(container, part, &mut diags);
    tracing::debug!(
        diagnostics = diags.len(),
        strict = policy.strict,
        scope = %policy.scope,
        "validation finished"
    );
    if policy.strict {
        diags.promoted()
    } else {
        diags
    }
}

/// Validates a container against the part its IDCODE names in `database`.
///
/// A part bound during decoding takes precedence.
pub fn validate_with_database(
    container: &BitstreamContainer,
    database: &Database,
    policy: &ValidationPolicy,
) -> Diagnostics {
    let part = container
        .part()
        .or_else(|| container.idcode().and_then(|id| database.lookup(id)));
    validate(container, part.map(|p| &**p), policy)
}

fn check_checksums(container: &BitstreamContainer, diags: &mut Diagnostics) {
    let checks = checksum_checks(container.packets());
    if checks.is_empty() {
        diags.push(Diagnostic::new(
            DiagnosticKind::MissingChecksum,
            "stream carries no CRC check",
            Location::NONE,
        ));
    }
    for check in checks.iter().filter(|c| !c.matches()) {
        diags.push(Diagnostic::new(
            DiagnosticKind::ChecksumMismatch,
            format!(
                "stated CRC 0x{:08X} does not match computed 0x{:08X}",
                check.stated, check.computed
            ),
            Location::at_packet(check.packet, check.offset),
        ));
    }
}

fn check_range(container: &BitstreamContainer, part: &PartDescriptor, diags: &mut Diagnostics) {
    for address in container.frames().addresses() {
        if !part.contains_frame(address) {
            diags.push(Diagnostic::new(
                DiagnosticKind::FrameOutOfRange,
                format!(
                    "frame {address} outside the {} frames of {}",
                    part.frame_count(),
                    part.name()
                ),
                Location::at_frame(address),
            ));
        }
    }
}

/// Coalesces the addresses of `expected` missing from `present` into runs.
fn missing_runs(expected: Range<u32>, present: &BTreeSet<u32>) -> Vec<Range<u32>> {
    let mut runs: Vec<Range<u32>> = Vec::new();
    for address in expected.filter(|a| !present.contains(a)) {
        match runs.last_mut() {
            Some(run) if run.end == address => run.end += 1,
            _ => runs.push(address..address + 1),
        }
    }
    runs
}

fn gap(run: Range<u32>, scope: &str) -> Diagnostic {
    let first = FrameAddress::from_raw(run.start);
    let count = run.end - run.start;
    let message = if count == 1 {
        format!("frame {first} of {scope} is not written")
    } else {
        let last = FrameAddress::from_raw(run.end - 1);
        format!("{count} frames {first}..={last} of {scope} are not written")
    };
    Diagnostic::new(DiagnosticKind::CoverageGap, message, Location::at_frame(first))
}

fn check_coverage(
    container: &BitstreamContainer,
    part: &PartDescriptor,
    scope: ReconfigScope,
    diags: &mut Diagnostics,
) {
    let present: BTreeSet<u32> = container
        .frames()
        .addresses()
        .map(FrameAddress::as_raw)
        .filter(|&a| a < part.frame_count())
        .collect();

    match scope {
        ReconfigScope::Device => {
            let label = format!("part {}", part.name());
            for run in missing_runs(0..part.frame_count(), &present) {
                diags.push(gap(run, &label));
            }
        }
        ReconfigScope::Columns => {
            let mut touched: BTreeMap<u32, &Segment> = BTreeMap::new();
            for &address in &present {
                if let Some(segment) = part.layout().segment_containing(address) {
                    touched.entry(segment.base).or_insert(segment);
                }
            }
            for segment in touched.values() {
                let label = format!(
                    "{} column (row {}, column {})",
                    segment.block, segment.row, segment.column
                );
                let end = segment.base + segment.frames;
                for run in missing_runs(segment.base..end, &present) {
                    diags.push(gap(run, &label));
                }
            }
        }
    }
}

fn check_identity(
    container: &BitstreamContainer,
    part: Option<&PartDescriptor>,
    diags: &mut Diagnostics,
) {
    let idcode = container.idcode();
    if idcode.is_none() {
        diags.push(Diagnostic::new(
            DiagnosticKind::MissingIdcode,
            "stream never writes the IDCODE register",
            Location::NONE,
        ));
    }

    let Some(part) = part else {
        let message = match idcode {
            Some(id) => format!("IDCODE {id} matches no part in the database"),
            None => "no part to check frame geometry against".to_string(),
        };
        diags.push(Diagnostic::new(
            DiagnosticKind::UnknownPart,
            message,
            Location::NONE,
        ));
        return;
    };

    if let Some(id) = idcode {
        if id.without_revision() != part.idcode().without_revision() {
            diags.push(
                Diagnostic::new(
                    DiagnosticKind::UnknownPart,
                    format!("stream IDCODE {id} does not match part {part}"),
                    Location::NONE,
                )
                .with_note("the bitstream was built for a different device"),
            );
        }
    }

    if let Some(header_part) = container.header().part.as_deref() {
        if !part.matches_header_part(header_part) {
            diags.push(Diagnostic::new(
                DiagnosticKind::HeaderPartMismatch,
                format!(
                    "header names part '{header_part}' but the stream targets {}",
                    part.name()
                ),
                Location::NONE,
            ));
        }
    }
}
