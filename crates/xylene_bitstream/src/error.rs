//! Errors that stop a decode.

use xylene_diagnostics::Diagnostic;

/// Fatal decode failures. Recoverable anomalies are diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// No sync word within the search window.
    #[error("sync word 0xAA995566 not found in the first {window} bytes")]
    SyncNotFound {
        /// The number of bytes searched.
        window: usize,
    },

    /// The input ends inside a header field or packet.
    #[error("truncated stream at byte 0x{offset:X}: {reason}")]
    TruncatedStream {
        /// Byte offset of the incomplete structure.
        offset: usize,
        /// What was incomplete.
        reason: String,
    },

    /// A word where a packet header was expected does not parse as one.
    #[error("desynchronized at byte 0x{offset:X}: unparseable packet header 0x{word:08X}")]
    Desynchronized {
        /// Byte offset of the word.
        offset: usize,
        /// The offending word.
        word: u32,
    },

    /// Strict mode rejected the input on a diagnostic.
    #[error("rejected in strict mode: [{}] {}", .0.code(), .0.message)]
    Rejected(Box<Diagnostic>),
}
