//! Error types for coordinate resolution and queries.

use xylene_common::{FrameAddress, IdCode};
use xylene_database::BlockType;

/// A coordinate or address outside a part's geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The row or column does not exist.
    #[error("row {row} column {column} is outside the part grid")]
    UnknownColumn {
        /// Requested row.
        row: u32,
        /// Requested column.
        column: u32,
    },

    /// The column holds no frames of the block type.
    #[error("row {row} column {column} has no {block} frames")]
    NoFrames {
        /// Requested block type.
        block: BlockType,
        /// Requested row.
        row: u32,
        /// Requested column.
        column: u32,
    },

    /// The minor exceeds the column's frame count.
    #[error("minor {minor} out of range for {frames} frames")]
    MinorOutOfRange {
        /// Requested minor.
        minor: u32,
        /// Frames in the column.
        frames: u32,
    },

    /// The word offset exceeds the frame length.
    #[error("word {word} out of range for {words}-word frames")]
    WordOutOfRange {
        /// Requested word.
        word: u32,
        /// Words per frame.
        words: usize,
    },

    /// The bit index exceeds 31.
    #[error("bit {bit} out of range for 32-bit words")]
    BitOutOfRange {
        /// Requested bit.
        bit: u8,
    },

    /// The frame address exceeds the part's frame count.
    #[error("frame {frame} out of range for {frames} frames")]
    FrameOutOfRange {
        /// Requested frame.
        frame: FrameAddress,
        /// Frames in the part.
        frames: u32,
    },
}

/// Errors from queries over bound bitstreams.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The bitstream's IDCODE has no database entry.
    #[error("no part in the database has IDCODE {idcode}")]
    UnknownPart {
        /// The IDCODE carried by the bitstream.
        idcode: IdCode,
    },

    /// The bitstream carries no IDCODE to bind a part by.
    #[error("bitstream carries no IDCODE to bind a part by")]
    MissingIdcode,

    /// A coordinate or address failed to resolve.
    #[error(transparent)]
    InvalidCoordinate(#[from] ResolveError),

    /// Two bitstreams target different parts.
    #[error("cannot compare a {left} bitstream with a {right} bitstream")]
    PartMismatch {
        /// Part of the first bitstream.
        left: String,
        /// Part of the second bitstream.
        right: String,
    },

    /// The part defines no register of that name.
    #[error("part {part} has no register named '{name}'")]
    UnknownRegister {
        /// Part name.
        part: String,
        /// Requested register.
        name: String,
    },

    /// The register has no instance at the requested column.
    #[error("register '{name}' has no instance at row {row} column {column}")]
    NoSuchInstance {
        /// Register name.
        name: String,
        /// Requested row.
        row: u32,
        /// Requested column.
        column: u32,
    },
}
