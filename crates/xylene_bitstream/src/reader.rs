//! The decode pipeline: sync search, header, packets, replay, finalize.

use crate::container::BitstreamContainer;
use crate::crc::checksum_checks;
use crate::error::DecodeError;
use crate::header::parse_header;
use crate::packet::{parse_packets, SYNC_WORD};
use crate::replay::{replay, ReplayContext};
use std::sync::Arc;
use xylene_common::units::KIB;
use xylene_common::ContentHash;
use xylene_database::{Database, PartDescriptor};
use xylene_diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location, Severity};

/// Default sync-word search window in bytes.
pub const DEFAULT_SYNC_WINDOW: usize = 64 * KIB as usize;

/// Options controlling a decode.
#[derive(Clone)]
pub struct DecodeOptions<'a> {
    /// Database used to bind a part by IDCODE.
    pub database: Option<&'a Database>,
    /// Part to bind regardless of the IDCODE.
    pub part: Option<Arc<PartDescriptor>>,
    /// Reject the input on any warning.
    pub strict: bool,
    /// How many leading bytes may precede the sync word.
    pub sync_window: usize,
    /// Frame length override in 32-bit words.
    pub frame_words: Option<usize>,
}

impl Default for DecodeOptions<'_> {
    fn default() -> Self {
        Self {
            database: None,
            part: None,
            strict: false,
            sync_window: DEFAULT_SYNC_WINDOW,
            frame_words: None,
        }
    }
}

impl<'a> DecodeOptions<'a> {
    /// Binds parts by IDCODE from `database`.
    pub fn with_database(mut self, database: &'a Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Binds `part` regardless of the IDCODE.
    pub fn with_part(mut self, part: Arc<PartDescriptor>) -> Self {
        self.part = Some(part);
        self
    }

    /// Sets strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the sync-word search window.
    pub fn with_sync_window(mut self, bytes: usize) -> Self {
        self.sync_window = bytes;
        self
    }

    /// Overrides the frame length.
    pub fn with_frame_words(mut self, words: usize) -> Self {
        self.frame_words = Some(words);
        self
    }
}

/// Returns the byte offset of the sync word if it starts within `window` bytes.
pub fn find_sync(bytes: &[u8], window: usize) -> Option<usize> {
    let needle = SYNC_WORD.to_be_bytes();
    let limit = bytes.len().min(window.saturating_add(needle.len()));
    bytes[..limit]
        .windows(needle.len())
        .position(|w| w == needle)
        .filter(|&pos| pos < window)
}

/// Decodes a bitstream.
///
/// Returns the container and every recoverable anomaly found along the way.
/// In strict mode the first warning-or-worse anomaly fails the decode with
/// [`DecodeError::Rejected`].
pub fn decode(
    bytes: &[u8],
    options: &DecodeOptions<'_>,
) -> Result<(BitstreamContainer, Diagnostics), DecodeError> {
    let window = options.sync_window;
    let sync_offset = find_sync(bytes, window).ok_or(DecodeError::SyncNotFound {
        window: window.min(bytes.len()),
    })?;
    tracing::debug!(sync_offset, "found sync word");

    let header = parse_header(&bytes[..sync_offset])?;
    let mut diagnostics = Diagnostics::new();
    if let Some(declared) = header.data_length {
        let present = bytes.len() - header.end;
        if declared as usize > present {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::LengthMismatch,
                format!("header declares {declared} data bytes but {present} are present"),
                Location::at_byte(header.end),
            ));
        }
    }

    let data_start = sync_offset + 4;
    let stream = parse_packets(&bytes[data_start..], data_start)?;
    tracing::debug!(
        packets = stream.packets.len(),
        desynced = stream.desynced,
        "parsed packets"
    );

    let ctx = ReplayContext {
        frame_words: options.frame_words,
        part: options.part.clone(),
        database: options.database,
    };
    let outcome = replay(&stream.packets, &ctx);
    diagnostics.extend(outcome.diagnostics);

    let checks = checksum_checks(&stream.packets);
    if checks.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingChecksum,
            "stream carries no CRC check",
            Location::NONE,
        ));
    }
    for check in checks.iter().filter(|c| !c.matches()) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::ChecksumMismatch,
            format!(
                "stated CRC 0x{:08X} does not match computed 0x{:08X}",
                check.stated, check.computed
            ),
            Location::at_packet(check.packet, check.offset),
        ));
    }

    if let Some(offset) = stream.trailing {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::TrailingData,
            format!("{} bytes follow the DESYNC command", bytes.len() - offset),
            Location::at_byte(offset),
        ));
    }
    if !stream.desynced {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingDesync,
            "stream ends without a DESYNC command",
            Location::at_byte(bytes.len()),
        ));
    }

    if options.strict {
        if let Some(diag) = diagnostics.first_at_least(Severity::Warning) {
            return Err(DecodeError::Rejected(Box::new(diag.clone().promoted())));
        }
    }

    let container = BitstreamContainer {
        header,
        sync_offset,
        packets: stream.packets,
        idcode: outcome.idcode,
        frames: outcome.frames,
        frame_words: outcome.frame_words,
        part: outcome.part,
        fingerprint: ContentHash::from_bytes(bytes),
    };
    Ok((container, diagnostics))
}
