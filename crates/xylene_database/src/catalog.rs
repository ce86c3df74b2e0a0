//! Catalog documents and their validation into [`PartDescriptor`]s.
//!
//! A catalog is a list of parts:
//!
//! ```text
//! {
//!   "parts": [{
//!     "name": "xy7s25", "family": "xy7", "idcode": "0x0362D093",
//!     "words_per_frame": 101, "frame_count": 16, "rows": 2,
//!     "grid": [["CLB", "CLB"], ["CLB", "CLB"]],
//!     "column_types": { "CLB": { "frames": { "logic": 4 } } },
//!     "registers": [{ "name": "LUT_A", "column_type": "CLB",
//!                     "frame": 1, "bits": [0, 64] }]
//!   }]
//! }
//! ```

use crate::error::DatabaseError;
use crate::layout::FrameLayout;
use crate::part::{BitRange, BlockType, ColumnType, MajorOrder, PartDescriptor, RegisterDef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use xylene_common::IdCode;

/// A catalog document as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Every part in the catalog.
    pub parts: Vec<PartEntry>,
}

/// One part as stored in a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    /// Part name.
    pub name: String,
    /// Family name.
    #[serde(default)]
    pub family: String,
    /// IDCODE as a hex string.
    pub idcode: String,
    /// Words in every frame.
    pub words_per_frame: usize,
    /// Declared total frame count.
    pub frame_count: u32,
    /// Major order of the frame layout.
    #[serde(default)]
    pub major_order: MajorOrder,
    /// Number of rows.
    pub rows: u32,
    /// Column-type names per row.
    pub grid: Vec<Vec<String>>,
    /// Column types by name.
    pub column_types: BTreeMap<String, ColumnTypeEntry>,
    /// Named registers.
    #[serde(default)]
    pub registers: Vec<RegisterEntry>,
}

/// A column type as stored in a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeEntry {
    /// Frames per block type, keyed by block type name.
    pub frames: BTreeMap<String, u32>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// A register as stored in a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEntry {
    /// Register name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Column type the register repeats in.
    #[serde(default)]
    pub column_type: Option<String>,
    /// Block type of the register's frame.
    #[serde(default)]
    pub block: BlockType,
    /// Minor offset or absolute frame address.
    pub frame: u32,
    /// Half-open frame-relative bit range.
    pub bits: [u32; 2],
}

impl PartEntry {
    /// Validates the entry and builds its descriptor and frame layout.
    pub fn into_descriptor(self) -> Result<PartDescriptor, DatabaseError> {
        let name = self.name.as_str();

        let idcode: IdCode = self
            .idcode
            .parse()
            .map_err(|e| DatabaseError::malformed(name, format!("{e}")))?;

        if self.words_per_frame == 0 {
            return Err(DatabaseError::malformed(name, "words_per_frame is zero"));
        }
        let bits_per_frame = u32::try_from(self.words_per_frame)
            .ok()
            .and_then(|w| w.checked_mul(32))
            .ok_or_else(|| DatabaseError::malformed(name, "words_per_frame is too large"))?;

        if self.rows as usize != self.grid.len() {
            return Err(DatabaseError::malformed(
                name,
                format!(
                    "declares {} rows but the grid has {}",
                    self.rows,
                    self.grid.len()
                ),
            ));
        }

        let mut column_types = BTreeMap::new();
        for (type_name, entry) in &self.column_types {
            let mut frames = BTreeMap::new();
            for (block_name, &count) in &entry.frames {
                let block: BlockType = block_name.parse().map_err(|e: String| {
                    DatabaseError::malformed(name, format!("column type '{type_name}': {e}"))
                })?;
                frames.insert(block, count);
            }
            column_types.insert(
                type_name.clone(),
                ColumnType {
                    name: type_name.clone(),
                    description: entry.description.clone(),
                    frames,
                },
            );
        }

        for (row, columns) in self.grid.iter().enumerate() {
            for (column, type_name) in columns.iter().enumerate() {
                if !column_types.contains_key(type_name) {
                    return Err(DatabaseError::malformed(
                        name,
                        format!(
                            "grid row {row} column {column} names undefined column type '{type_name}'"
                        ),
                    ));
                }
            }
        }

        let layout = FrameLayout::build(&self.grid, &column_types, self.major_order);
        if layout.total_frames() != u64::from(self.frame_count) {
            return Err(DatabaseError::malformed(
                name,
                format!(
                    "grid lays out {} frames but frame_count is {}",
                    layout.total_frames(),
                    self.frame_count
                ),
            ));
        }

        let mut seen = HashSet::new();
        let mut registers = Vec::with_capacity(self.registers.len());
        for reg in &self.registers {
            if !seen.insert(reg.name.as_str()) {
                return Err(DatabaseError::malformed(
                    name,
                    format!("register '{}' defined twice", reg.name),
                ));
            }
            let bad = |reason: String| {
                DatabaseError::malformed(name, format!("register '{}': {reason}", reg.name))
            };

            match &reg.column_type {
                Some(ct_name) => {
                    let ct = column_types
                        .get(ct_name)
                        .ok_or_else(|| bad(format!("undefined column type '{ct_name}'")))?;
                    let frames = ct.frames_for(reg.block);
                    if frames == 0 {
                        return Err(bad(format!(
                            "column type '{ct_name}' has no {} frames",
                            reg.block
                        )));
                    }
                    if reg.frame >= frames {
                        return Err(bad(format!(
                            "minor {} out of range for {frames} {} frames",
                            reg.frame, reg.block
                        )));
                    }
                }
                None => {
                    if reg.frame >= self.frame_count {
                        return Err(bad(format!(
                            "frame {} out of range for {} frames",
                            reg.frame, self.frame_count
                        )));
                    }
                }
            }

            let bits = BitRange::new(reg.bits[0], reg.bits[1]);
            if bits.is_empty() {
                return Err(bad(format!("empty bit range {bits}")));
            }
            if bits.end > bits_per_frame {
                return Err(bad(format!(
                    "bit range {bits} exceeds the {bits_per_frame}-bit frame"
                )));
            }

            registers.push(RegisterDef {
                name: reg.name.clone(),
                description: reg.description.clone(),
                column_type: reg.column_type.clone(),
                block: reg.block,
                frame: reg.frame,
                bits,
            });
        }

        Ok(PartDescriptor {
            name: self.name,
            family: self.family,
            idcode,
            words_per_frame: self.words_per_frame,
            frame_count: self.frame_count,
            major_order: self.major_order,
            grid: self.grid,
            column_types,
            registers,
            layout,
        })
    }
}

impl From<&PartDescriptor> for PartEntry {
    fn from(part: &PartDescriptor) -> Self {
        PartEntry {
            name: part.name.clone(),
            family: part.family.clone(),
            idcode: part.idcode.to_string(),
            words_per_frame: part.words_per_frame,
            frame_count: part.frame_count,
            major_order: part.major_order,
            rows: part.grid.len() as u32,
            grid: part.grid.clone(),
            column_types: part
                .column_types
                .iter()
                .map(|(name, ct)| {
                    (
                        name.clone(),
                        ColumnTypeEntry {
                            frames: ct
                                .frames
                                .iter()
                                .map(|(b, &n)| (b.as_str().to_string(), n))
                                .collect(),
                            description: ct.description.clone(),
                        },
                    )
                })
                .collect(),
            registers: part
                .registers
                .iter()
                .map(|r| RegisterEntry {
                    name: r.name.clone(),
                    description: r.description.clone(),
                    column_type: r.column_type.clone(),
                    block: r.block,
                    frame: r.frame,
                    bits: [r.bits.start, r.bits.end],
                })
                .collect(),
        }
    }
}
