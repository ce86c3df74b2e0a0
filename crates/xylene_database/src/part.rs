//! Part descriptors: geometry, frame length, and named registers.

use crate::layout::FrameLayout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use xylene_common::{FrameAddress, IdCode};

/// The kind of configuration memory a frame belongs to.
///
/// Frame addresses are partitioned by block type in declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    /// Interconnect and logic configuration.
    #[default]
    Logic,
    /// Block RAM content.
    BlockRam,
    /// Clock distribution.
    Clock,
    /// I/O configuration.
    Io,
    /// Device-specific special frames.
    Special,
}

impl BlockType {
    /// Every block type in frame-address order.
    pub const ALL: [BlockType; 5] = [
        BlockType::Logic,
        BlockType::BlockRam,
        BlockType::Clock,
        BlockType::Io,
        BlockType::Special,
    ];

    /// Returns the catalog spelling of this block type.
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Logic => "logic",
            BlockType::BlockRam => "block-ram",
            BlockType::Clock => "clock",
            BlockType::Io => "io",
            BlockType::Special => "special",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown block type '{s}'"))
    }
}

/// How major positions (row, column) are enumerated within a block type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MajorOrder {
    /// Column outer, row inner.
    #[default]
    ColumnMajor,
    /// Row outer, column inner.
    RowMajor,
}

/// A column type: how many frames each block type occupies in one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnType {
    /// The column type name as used in the grid.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Frames per block type; absent block types have no frames.
    pub frames: BTreeMap<BlockType, u32>,
}

impl ColumnType {
    /// Returns the number of frames of `block` in one column of this type.
    pub fn frames_for(&self, block: BlockType) -> u32 {
        self.frames.get(&block).copied().unwrap_or(0)
    }
}

/// A half-open range `[start, end)` of frame-relative bit offsets.
///
/// A frame-relative offset is `word * 32 + bit`, with bit 0 the LSB of the word.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct BitRange {
    /// First bit offset (inclusive).
    pub start: u32,
    /// One past the last bit offset.
    pub end: u32,
}

impl BitRange {
    /// Creates a bit range.
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns the number of bits in the range.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range holds no bits.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `offset` lies within the range.
    pub fn contains(&self, offset: u32) -> bool {
        (self.start..self.end).contains(&offset)
    }

    /// Iterates over the bit offsets in the range.
    pub fn offsets(&self) -> std::ops::Range<u32> {
        self.start..self.end
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A named configuration register.
///
/// With a `column_type`, the register repeats in every column of that type
/// and `frame` is the minor offset within the column's `block` frames.
/// Without one, `frame` is an absolute frame address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterDef {
    /// Register name, unique within the part.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Column type the register repeats in, if any.
    pub column_type: Option<String>,
    /// Block type holding the register's frame.
    pub block: BlockType,
    /// Minor offset (column-relative) or absolute frame address.
    pub frame: u32,
    /// Frame-relative bit offsets.
    pub bits: BitRange,
}

/// An immutable description of one part, shared by `Arc` across bitstreams.
#[derive(Clone, Debug)]
pub struct PartDescriptor {
    pub(crate) name: String,
    pub(crate) family: String,
    pub(crate) idcode: IdCode,
    pub(crate) words_per_frame: usize,
    pub(crate) frame_count: u32,
    pub(crate) major_order: MajorOrder,
    pub(crate) grid: Vec<Vec<String>>,
    pub(crate) column_types: BTreeMap<String, ColumnType>,
    pub(crate) registers: Vec<RegisterDef>,
    pub(crate) layout: FrameLayout,
}

impl PartDescriptor {
    /// Returns the part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the part's IDCODE.
    pub fn idcode(&self) -> IdCode {
        self.idcode
    }

    /// Returns the number of 32-bit words in every frame.
    pub fn words_per_frame(&self) -> usize {
        self.words_per_frame
    }

    /// Returns the number of bits in every frame.
    pub fn bits_per_frame(&self) -> u32 {
        (self.words_per_frame as u32).saturating_mul(32)
    }

    /// Returns the declared total frame count.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Returns `true` if `address` lies within the declared frame range.
    pub fn contains_frame(&self, address: FrameAddress) -> bool {
        address.as_raw() < self.frame_count
    }

    /// Returns the major order used to lay out frame addresses.
    pub fn major_order(&self) -> MajorOrder {
        self.major_order
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> u32 {
        self.grid.len() as u32
    }

    /// Returns the number of columns in `row`, or 0 for a row outside the part.
    pub fn columns(&self, row: u32) -> u32 {
        self.grid.get(row as usize).map_or(0, |r| r.len() as u32)
    }

    /// Returns the column type at `(row, column)`.
    pub fn column_type(&self, row: u32, column: u32) -> Option<&ColumnType> {
        let name = self.grid.get(row as usize)?.get(column as usize)?;
        self.column_types.get(name)
    }

    /// Returns every column type by name.
    pub fn column_types(&self) -> &BTreeMap<String, ColumnType> {
        &self.column_types
    }

    /// Returns the named registers in catalog order.
    pub fn registers(&self) -> &[RegisterDef] {
        &self.registers
    }

    /// Looks up a register by name.
    pub fn register(&self, name: &str) -> Option<&RegisterDef> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Returns the precomputed frame layout.
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Returns `true` if the header's part string names this part.
    ///
    /// Header strings carry package and speed suffixes (`xc7a35tcpg236-1`),
    /// so a prefix match on the part name is accepted.
    pub fn matches_header_part(&self, header_part: &str) -> bool {
        header_part
            .to_ascii_lowercase()
            .starts_with(&self.name.to_ascii_lowercase())
    }
}

impl fmt::Display for PartDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.family, self.idcode)
    }
}
