//! Error types for database loading and the XCM container.

use std::path::PathBuf;

/// Errors that can occur when loading a device database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The catalog parsed but describes inconsistent geometry.
    #[error("malformed database: part '{part}': {reason}")]
    Malformed {
        /// The offending part's name.
        part: String,
        /// What is inconsistent.
        reason: String,
    },

    /// The catalog text could not be parsed.
    #[error("failed to parse catalog: {0}")]
    Parse(String),

    /// The catalog file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file extension does not name a catalog format.
    #[error("unsupported catalog format '{}': expected .json, .toml or .xcm", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The XCM container is invalid.
    #[error(transparent)]
    Xcm(#[from] XcmError),
}

impl DatabaseError {
    pub(crate) fn malformed(part: &str, reason: impl Into<String>) -> Self {
        DatabaseError::Malformed {
            part: part.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur when reading or writing an XCM container.
#[derive(Debug, thiserror::Error)]
pub enum XcmError {
    /// The magic number is not `XCM1`.
    #[error("incorrect magic number 0x{0:08X}, not a valid XCM")]
    BadMagic(u32),

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch (stored 0x{stored:016X}, computed 0x{computed:016X}), corrupted XCM")]
    ChecksumMismatch {
        /// The checksum stored in the file.
        stored: u64,
        /// The checksum of the payload.
        computed: u64,
    },

    /// The container ends before its declared contents.
    #[error("XCM truncated: {0}")]
    Truncated(&'static str),

    /// The compression code is unknown or not supported.
    #[error("unsupported XCM compression 0x{0:02X}")]
    UnsupportedCompression(u8),

    /// The content code is unknown.
    #[error("unknown XCM content type 0x{0:02X}")]
    UnknownContent(u8),

    /// The payload could not be encoded or decoded.
    #[error("XCM payload codec error: {0}")]
    Codec(String),

    /// An I/O error from the compression stream.
    #[error("XCM I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_malformed() {
        let err = DatabaseError::malformed("xc7a35t", "words_per_frame is zero");
        assert_eq!(
            format!("{err}"),
            "malformed database: part 'xc7a35t': words_per_frame is zero"
        );
    }

    #[test]
    fn display_unsupported_format() {
        let err = DatabaseError::UnsupportedFormat(PathBuf::from("parts.yaml"));
        assert!(format!("{err}").contains("parts.yaml"));
    }

    #[test]
    fn display_bad_magic() {
        let err = XcmError::BadMagic(0xDEADBEEF);
        assert_eq!(
            format!("{err}"),
            "incorrect magic number 0xDEADBEEF, not a valid XCM"
        );
    }

    #[test]
    fn xcm_error_converts() {
        let err: DatabaseError = XcmError::Truncated("header").into();
        assert!(matches!(err, DatabaseError::Xcm(XcmError::Truncated(_))));
    }
}
