//! Dense frame-address layout of a part.
//!
//! Addresses are assigned block type by block type. Within a block type the
//! major positions are walked in the part's [`MajorOrder`], and every column
//! holding frames of that block type receives a contiguous run of addresses,
//! one per minor. The result is a table of [`Segment`]s sorted by base
//! address, so both directions of translation are table lookups.

use crate::part::{BlockType, ColumnType, MajorOrder};
use std::collections::{BTreeMap, HashMap};

/// A contiguous run of frame addresses belonging to one column and block type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Segment {
    /// Block type of every frame in the run.
    pub block: BlockType,
    /// Row of the column.
    pub row: u32,
    /// Column index within the row.
    pub column: u32,
    /// Address of minor 0.
    pub base: u32,
    /// Number of frames (minors) in the run.
    pub frames: u32,
}

impl Segment {
    /// Returns one past the last address in the run.
    pub fn end(&self) -> u64 {
        u64::from(self.base) + u64::from(self.frames)
    }

    /// Returns `true` if `address` lies within the run.
    pub fn contains(&self, address: u32) -> bool {
        address >= self.base && u64::from(address) < self.end()
    }
}

/// The segment table of a part.
#[derive(Clone, Debug, Default)]
pub struct FrameLayout {
    segments: Vec<Segment>,
    index: HashMap<(BlockType, u32, u32), usize>,
    total: u64,
}

impl FrameLayout {
    /// Computes the layout of a grid.
    ///
    /// Grid entries naming unknown column types contribute no frames; callers
    /// validate the grid first.
    pub fn build(
        grid: &[Vec<String>],
        column_types: &BTreeMap<String, ColumnType>,
        order: MajorOrder,
    ) -> Self {
        let mut layout = FrameLayout::default();
        let rows = grid.len() as u32;
        let max_columns = grid.iter().map(Vec::len).max().unwrap_or(0) as u32;

        let positions: Vec<(u32, u32)> = match order {
            MajorOrder::ColumnMajor => (0..max_columns)
                .flat_map(|c| (0..rows).map(move |r| (r, c)))
                .collect(),
            MajorOrder::RowMajor => (0..rows)
                .flat_map(|r| (0..max_columns).map(move |c| (r, c)))
                .collect(),
        };

        for block in BlockType::ALL {
            for &(row, column) in &positions {
                let Some(name) = grid[row as usize].get(column as usize) else {
                    continue;
                };
                let frames = column_types.get(name).map_or(0, |ct| ct.frames_for(block));
                if frames == 0 {
                    continue;
                }
                layout.push(Segment {
                    block,
                    row,
                    column,
                    base: layout.total.min(u64::from(u32::MAX)) as u32,
                    frames,
                });
            }
        }
        layout
    }

    fn push(&mut self, segment: Segment) {
        self.index.insert(
            (segment.block, segment.row, segment.column),
            self.segments.len(),
        );
        self.total += u64::from(segment.frames);
        self.segments.push(segment);
    }

    /// Returns the total number of frames laid out.
    ///
    /// Kept as `u64` so an oversized grid can be detected rather than wrap.
    pub fn total_frames(&self) -> u64 {
        self.total
    }

    /// Returns every segment in address order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the segment for a column and block type.
    pub fn segment(&self, block: BlockType, row: u32, column: u32) -> Option<&Segment> {
        self.index
            .get(&(block, row, column))
            .map(|&i| &self.segments[i])
    }

    /// Returns the segment holding `address`.
    pub fn segment_containing(&self, address: u32) -> Option<&Segment> {
        let i = self.segments.partition_point(|s| s.base <= address);
        let segment = self.segments.get(i.checked_sub(1)?)?;
        segment.contains(address).then_some(segment)
    }

    /// Returns the segments of one column, across block types.
    pub fn column_segments(&self, row: u32, column: u32) -> impl Iterator<Item = &Segment> + '_ {
        BlockType::ALL
            .into_iter()
            .filter_map(move |block| self.segment(block, row, column))
    }
}
