//! Translation between logical frame coordinates and physical addresses.
//!
//! A [`FrameCoordinate`] names a bit by where it sits in the device grid:
//! row, column, block type, minor frame within the column, then word and bit
//! within the frame. A [`PhysicalAddress`] names the same bit by the linear
//! frame address the FAR register carries. Both directions go through the
//! part's precomputed [`FrameLayout`](xylene_database::FrameLayout), so they
//! are exact inverses on the part's valid range.

use crate::error::ResolveError;
use serde::Serialize;
use std::fmt;
use xylene_common::FrameAddress;
use xylene_database::{BlockType, PartDescriptor};

/// A bit position in grid terms.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct FrameCoordinate {
    /// Row of the column.
    pub row: u32,
    /// Column index within the row.
    pub column: u32,
    /// Block type of the frame.
    pub block: BlockType,
    /// Minor frame within the column.
    pub minor: u32,
    /// Word offset within the frame.
    pub word: u32,
    /// Bit index within the word, 0 = LSB.
    pub bit: u8,
}

impl FrameCoordinate {
    /// Returns the frame this coordinate lies in.
    pub fn location(&self) -> FrameLocation {
        FrameLocation {
            block: self.block,
            row: self.row,
            column: self.column,
            minor: self.minor,
        }
    }
}

impl fmt::Display for FrameCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} word {} bit {}", self.location(), self.word, self.bit)
    }
}

/// A bit position in address terms.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct PhysicalAddress {
    /// Linear frame address.
    pub frame: FrameAddress,
    /// Word offset within the frame.
    pub word: u32,
    /// Bit index within the word, 0 = LSB.
    pub bit: u8,
}

impl PhysicalAddress {
    /// Creates a physical address.
    pub fn new(frame: FrameAddress, word: u32, bit: u8) -> Self {
        Self { frame, word, bit }
    }

    /// Creates a physical address from a frame-relative bit offset.
    pub fn from_frame_bit(frame: FrameAddress, offset: u32) -> Self {
        Self {
            frame,
            word: offset / 32,
            bit: (offset % 32) as u8,
        }
    }

    /// Returns the frame-relative bit offset (`word * 32 + bit`).
    pub fn frame_bit(&self) -> u32 {
        self.word * 32 + u32::from(self.bit)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {} word {} bit {}", self.frame, self.word, self.bit)
    }
}

/// A whole frame in grid terms.
///
/// Orders by block type first, matching the address layout.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct FrameLocation {
    /// Block type of the frame.
    pub block: BlockType,
    /// Row of the column.
    pub row: u32,
    /// Column index within the row.
    pub column: u32,
    /// Minor frame within the column.
    pub minor: u32,
}

impl fmt::Display for FrameLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {} column {} minor {}",
            self.block, self.row, self.column, self.minor
        )
    }
}

/// Returns the frame address of a frame location.
pub fn frame_address(
    location: FrameLocation,
    part: &PartDescriptor,
) -> Result<FrameAddress, ResolveError> {
    let FrameLocation {
        block,
        row,
        column,
        minor,
    } = location;
    if column >= part.columns(row) {
        return Err(ResolveError::UnknownColumn { row, column });
    }
    let segment = part
        .layout()
        .segment(block, row, column)
        .ok_or(ResolveError::NoFrames { block, row, column })?;
    if minor >= segment.frames {
        return Err(ResolveError::MinorOutOfRange {
            minor,
            frames: segment.frames,
        });
    }
    Ok(FrameAddress::from_raw(segment.base + minor))
}

/// Returns the grid location of a frame address.
pub fn locate_frame(
    address: FrameAddress,
    part: &PartDescriptor,
) -> Result<FrameLocation, ResolveError> {
    let segment = part
        .layout()
        .segment_containing(address.as_raw())
        .ok_or(ResolveError::FrameOutOfRange {
            frame: address,
            frames: part.frame_count(),
        })?;
    Ok(FrameLocation {
        block: segment.block,
        row: segment.row,
        column: segment.column,
        minor: address.as_raw() - segment.base,
    })
}

fn check_offset(word: u32, bit: u8, part: &PartDescriptor) -> Result<(), ResolveError> {
    if word as usize >= part.words_per_frame() {
        return Err(ResolveError::WordOutOfRange {
            word,
            words: part.words_per_frame(),
        });
    }
    if bit >= 32 {
        return Err(ResolveError::BitOutOfRange { bit });
    }
    Ok(())
}

/// Resolves a grid coordinate to its physical address.
pub fn to_physical(
    coordinate: FrameCoordinate,
    part: &PartDescriptor,
) -> Result<PhysicalAddress, ResolveError> {
    let frame = frame_address(coordinate.location(), part)?;
    check_offset(coordinate.word, coordinate.bit, part)?;
    Ok(PhysicalAddress::new(frame, coordinate.word, coordinate.bit))
}

/// Resolves a physical address to its grid coordinate.
pub fn to_logical(
    address: PhysicalAddress,
    part: &PartDescriptor,
) -> Result<FrameCoordinate, ResolveError> {
    let location = locate_frame(address.frame, part)?;
    check_offset(address.word, address.bit, part)?;
    Ok(FrameCoordinate {
        row: location.row,
        column: location.column,
        block: location.block,
        minor: location.minor,
        word: address.word,
        bit: address.bit,
    })
}
