//! Bit-level questions about bound bitstreams.
//!
//! Every function here is a pure read over a [`Bitstream`] or a part. Bits in
//! frames the bitstream does not carry are reported as `None` rather than
//! assumed zero, except where two frames are compared bit by bit.

use crate::bitstream::Bitstream;
use crate::error::QueryError;
use crate::resolver::{locate_frame, to_logical, FrameCoordinate, FrameLocation, PhysicalAddress};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{btree_map, BTreeSet};
use std::iter::Peekable;
use xylene_bitstream::ConfigFrame;
use xylene_common::FrameAddress;
use xylene_database::{BitRange, PartDescriptor, RegisterDef};

/// What a configuration bit controls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BitMeaning {
    /// The bit belongs to a named register.
    Mapped {
        /// Register name.
        register: String,
        /// Register description.
        description: String,
        /// Bit index within the register, 0 = first bit of its range.
        index: u32,
        /// Grid coordinate of the bit.
        coordinate: FrameCoordinate,
        /// Current value, `None` when the frame is absent.
        value: Option<bool>,
    },
    /// No register covers the bit.
    Unmapped {
        /// Grid coordinate of the bit.
        coordinate: FrameCoordinate,
        /// Current value, `None` when the frame is absent.
        value: Option<bool>,
    },
}

impl BitMeaning {
    /// Returns the grid coordinate of the bit.
    pub fn coordinate(&self) -> FrameCoordinate {
        match self {
            BitMeaning::Mapped { coordinate, .. } | BitMeaning::Unmapped { coordinate, .. } => {
                *coordinate
            }
        }
    }

    /// Returns the bit's current value.
    pub fn value(&self) -> Option<bool> {
        match self {
            BitMeaning::Mapped { value, .. } | BitMeaning::Unmapped { value, .. } => *value,
        }
    }
}

fn register_covers(
    reg: &RegisterDef,
    part: &PartDescriptor,
    address: PhysicalAddress,
    coord: &FrameCoordinate,
) -> bool {
    let frame_matches = match &reg.column_type {
        Some(ct) => {
            reg.block == coord.block
                && reg.frame == coord.minor
                && part
                    .column_type(coord.row, coord.column)
                    .is_some_and(|t| &t.name == ct)
        }
        None => reg.frame == address.frame.as_raw(),
    };
    frame_matches && reg.bits.contains(address.frame_bit())
}

/// Explains a single bit.
pub fn describe_bit(bs: &Bitstream, address: PhysicalAddress) -> Result<BitMeaning, QueryError> {
    let part = bs.part();
    let coordinate = to_logical(address, part)?;
    let value = bs.bit(address);
    let meaning = match part
        .registers()
        .iter()
        .find(|reg| register_covers(reg, part, address, &coordinate))
    {
        Some(reg) => BitMeaning::Mapped {
            register: reg.name.clone(),
            description: reg.description.clone(),
            index: address.frame_bit() - reg.bits.start,
            coordinate,
            value,
        },
        None => BitMeaning::Unmapped { coordinate, value },
    };
    Ok(meaning)
}

/// One bit that differs between two frames.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct BitChange {
    /// Word offset within the frame.
    pub word: u32,
    /// Bit index within the word.
    pub bit: u8,
    /// Value in the first bitstream.
    pub old: bool,
    /// Value in the second bitstream.
    pub new: bool,
}

/// A frame whose content differs between two bitstreams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrameDiff {
    /// Frame address.
    pub address: FrameAddress,
    /// Grid location, `None` for frames outside the part.
    pub location: Option<FrameLocation>,
    /// Frame data in the first bitstream.
    pub old: Option<Vec<u32>>,
    /// Frame data in the second bitstream.
    pub new: Option<Vec<u32>>,
}

impl FrameDiff {
    /// Expands the diff into per-bit changes. Absent frames read as zero.
    pub fn changed_bits(&self) -> Vec<BitChange> {
        let old = self.old.as_deref().unwrap_or_default();
        let new = self.new.as_deref().unwrap_or_default();
        let words = old.len().max(new.len());
        let mut changes = Vec::new();
        for word in 0..words {
            let a = old.get(word).copied().unwrap_or(0);
            let b = new.get(word).copied().unwrap_or(0);
            let mut flipped = a ^ b;
            while flipped != 0 {
                let bit = flipped.trailing_zeros();
                flipped &= flipped - 1;
                changes.push(BitChange {
                    word: word as u32,
                    bit: bit as u8,
                    old: (a >> bit) & 1 == 1,
                    new: (b >> bit) & 1 == 1,
                });
            }
        }
        changes
    }
}

type Frames<'a> = Peekable<btree_map::Values<'a, FrameAddress, ConfigFrame>>;

/// Differing frames of two bitstreams, in ascending address order.
///
/// Produced lazily by merging both frame tables.
pub struct FrameDiffs<'a> {
    part: &'a PartDescriptor,
    left: Frames<'a>,
    right: Frames<'a>,
}

impl Iterator for FrameDiffs<'_> {
    type Item = FrameDiff;

    fn next(&mut self) -> Option<FrameDiff> {
        loop {
            let order = match (self.left.peek(), self.right.peek()) {
                (None, None) => return None,
                (Some(l), Some(r)) => l.address.cmp(&r.address),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
            };
            let (old, new) = match order {
                Ordering::Less => (self.left.next(), None),
                Ordering::Greater => (None, self.right.next()),
                Ordering::Equal => (self.left.next(), self.right.next()),
            };
            if let (Some(a), Some(b)) = (old, new) {
                if a.data == b.data {
                    continue;
                }
            }
            let address = old.or(new)?.address;
            return Some(FrameDiff {
                address,
                location: locate_frame(address, self.part).ok(),
                old: old.map(|f| f.data.clone()),
                new: new.map(|f| f.data.clone()),
            });
        }
    }
}

/// Compares two bitstreams of the same part frame by frame.
pub fn diff<'a>(old: &'a Bitstream, new: &'a Bitstream) -> Result<FrameDiffs<'a>, QueryError> {
    if old.part().name() != new.part().name() {
        return Err(QueryError::PartMismatch {
            left: old.part().name().to_string(),
            right: new.part().name().to_string(),
        });
    }
    Ok(FrameDiffs {
        part: old.part(),
        left: old.container().frames().iter().peekable(),
        right: new.container().frames().iter().peekable(),
    })
}

/// Returns the grid location of every frame the bitstream writes.
///
/// Frames outside the part's range have no location and are left out; list
/// them with [`frames_outside`]. Validation reports each as `FrameOutOfRange`.
pub fn frames_touched(bs: &Bitstream) -> BTreeSet<FrameLocation> {
    bs.container()
        .frames()
        .addresses()
        .filter_map(|address| locate_frame(address, bs.part()).ok())
        .collect()
}

/// Returns the written frame addresses that fall outside the part, ascending.
pub fn frames_outside(bs: &Bitstream) -> Vec<FrameAddress> {
    bs.container()
        .frames()
        .addresses()
        .filter(|address| !bs.part().contains_frame(*address))
        .collect()
}

/// One placement of a named register.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterInstance {
    /// Register name.
    pub name: String,
    /// Row of the column, for per-column registers.
    pub row: Option<u32>,
    /// Column index, for per-column registers.
    pub column: Option<u32>,
    /// Frame holding the register.
    pub frame: FrameAddress,
    /// Frame-relative bit range.
    pub bits: BitRange,
}

impl RegisterInstance {
    /// Iterates over the physical address of every register bit, LSB first.
    pub fn addresses(&self) -> impl Iterator<Item = PhysicalAddress> + '_ {
        self.bits
            .offsets()
            .map(|offset| PhysicalAddress::from_frame_bit(self.frame, offset))
    }
}

/// The bits of one register instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterValue {
    /// Which instance was read.
    pub instance: RegisterInstance,
    /// Bits LSB first, `None` where the frame is absent.
    pub bits: Vec<Option<bool>>,
}

impl RegisterValue {
    /// Returns the value as an integer when every bit is known and it fits.
    pub fn as_u64(&self) -> Option<u64> {
        if self.bits.len() > 64 {
            return None;
        }
        self.bits
            .iter()
            .enumerate()
            .try_fold(0u64, |acc, (i, bit)| Some(acc | (u64::from((*bit)?) << i)))
    }
}

/// Returns every instance of a named register, in address order.
pub fn locate_register(
    part: &PartDescriptor,
    name: &str,
) -> Result<Vec<RegisterInstance>, QueryError> {
    let reg = part
        .register(name)
        .ok_or_else(|| QueryError::UnknownRegister {
            part: part.name().to_string(),
            name: name.to_string(),
        })?;

    let Some(column_type) = &reg.column_type else {
        return Ok(vec![RegisterInstance {
            name: reg.name.clone(),
            row: None,
            column: None,
            frame: FrameAddress::from_raw(reg.frame),
            bits: reg.bits,
        }]);
    };

    let instances = part
        .layout()
        .segments()
        .iter()
        .filter(|seg| seg.block == reg.block)
        .filter(|seg| {
            part.column_type(seg.row, seg.column)
                .is_some_and(|ct| &ct.name == column_type)
        })
        .map(|seg| RegisterInstance {
            name: reg.name.clone(),
            row: Some(seg.row),
            column: Some(seg.column),
            frame: FrameAddress::from_raw(seg.base + reg.frame),
            bits: reg.bits,
        })
        .collect();
    Ok(instances)
}

/// Reads a register's current bits.
///
/// `at` selects the instance by `(row, column)`; without it the first
/// instance in address order is read.
pub fn read_register(
    bs: &Bitstream,
    name: &str,
    at: Option<(u32, u32)>,
) -> Result<RegisterValue, QueryError> {
    let instances = locate_register(bs.part(), name)?;
    let instance = match at {
        Some((row, column)) => instances
            .into_iter()
            .find(|i| i.row == Some(row) && i.column == Some(column))
            .ok_or_else(|| QueryError::NoSuchInstance {
                name: name.to_string(),
                row,
                column,
            })?,
        None => instances
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::UnknownRegister {
                part: bs.part().name().to_string(),
                name: name.to_string(),
            })?,
    };
    let bits = instance.addresses().map(|addr| bs.bit(addr)).collect();
    Ok(RegisterValue { instance, bits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{database, part};
    use xylene_bitstream::builder::StreamBuilder;
    use xylene_bitstream::{decode, DecodeOptions};
    use xylene_database::BlockType;

    fn bound(frames: &[(u32, u32)]) -> Bitstream {
        let db = database();
        let mut builder = StreamBuilder::new().rcrc().idcode(0x0123_4093).wcfg();
        for &(address, word) in frames {
            builder = builder.far(address).fdri(&[word]);
        }
        let bytes = builder.crc().desync().build();
        let (container, _) = decode(&bytes, &DecodeOptions::default()).unwrap();
        Bitstream::bind(container, &db).unwrap()
    }

    #[test]
    fn describe_mapped_and_unmapped() {
        let bs = bound(&[(5, 0xDEAD_BEEF)]);
        let at = |frame: u32, bit: u8| PhysicalAddress::new(FrameAddress::from_raw(frame), 0, bit);
        let meaning = describe_bit(&bs, at(5, 3)).unwrap();
        match meaning {
            BitMeaning::Mapped {
                register,
                index,
                coordinate,
                value,
                ..
            } => {
                assert_eq!(register, "CFG");
                assert_eq!(index, 3);
                assert_eq!(
                    (coordinate.row, coordinate.column, coordinate.minor),
                    (1, 0, 1)
                );
                assert_eq!(value, Some(true));
            }
            other => panic!("expected a mapped bit, got {other:?}"),
        }

        let unmapped = describe_bit(&bs, at(5, 8)).unwrap();
        assert!(matches!(
            unmapped,
            BitMeaning::Unmapped {
                value: Some(false),
                ..
            }
        ));

        match describe_bit(&bs, at(15, 5)).unwrap() {
            BitMeaning::Mapped {
                register,
                index,
                value,
                ..
            } => {
                assert_eq!(register, "GLOBAL");
                assert_eq!(index, 1);
                assert_eq!(value, None);
            }
            other => panic!("expected GLOBAL, got {other:?}"),
        }

        assert!(matches!(
            describe_bit(&bs, at(16, 0)),
            Err(QueryError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn diff_reports_changed_added_and_removed_frames() {
        let a = bound(&[(0, 1), (1, 0xFF), (2, 3)]);
        let b = bound(&[(1, 0xFF), (2, 0), (4, 1)]);
        let diffs: Vec<FrameDiff> = diff(&a, &b).unwrap().collect();
        let addrs: Vec<u32> = diffs.iter().map(|d| d.address.as_raw()).collect();
        assert_eq!(addrs, vec![0, 2, 4]);

        assert_eq!(diffs[0].new, None);
        assert_eq!(
            diffs[0].changed_bits(),
            vec![BitChange {
                word: 0,
                bit: 0,
                old: true,
                new: false
            }]
        );
        let changed: Vec<u8> = diffs[1].changed_bits().iter().map(|c| c.bit).collect();
        assert_eq!(changed, vec![0, 1]);
        assert_eq!(diffs[2].old, None);
        assert_eq!(diffs[2].location.unwrap().row, 1);

        assert_eq!(diff(&a, &a).unwrap().count(), 0);
    }

    #[test]
    fn diff_rejects_different_parts() {
        let a = bound(&[(0, 1)]);
        let other = Bitstream::with_part(a.container().clone(), part("xyrag"));
        assert!(matches!(
            diff(&a, &other),
            Err(QueryError::PartMismatch { .. })
        ));
    }

    #[test]
    fn frames_touched_are_grid_locations() {
        let bs = bound(&[(5, 0xDEAD_BEEF), (12, 0), (20, 1)]);
        assert_eq!(frames_outside(&bs), vec![FrameAddress::from_raw(20)]);
        let touched: Vec<FrameLocation> = frames_touched(&bs).into_iter().collect();
        assert_eq!(
            touched,
            vec![
                FrameLocation {
                    block: BlockType::Logic,
                    row: 1,
                    column: 0,
                    minor: 1
                },
                FrameLocation {
                    block: BlockType::Logic,
                    row: 1,
                    column: 1,
                    minor: 0
                },
            ]
        );
    }

    #[test]
    fn registers_repeat_per_column() {
        let part = part("xy2x2");
        let instances = locate_register(&part, "CFG").unwrap();
        let frames: Vec<u32> = instances.iter().map(|i| i.frame.as_raw()).collect();
        assert_eq!(frames, vec![1, 5, 9, 13]);
        assert_eq!((instances[1].row, instances[1].column), (Some(1), Some(0)));

        let global = locate_register(&part, "GLOBAL").unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].row, None);

        assert!(matches!(
            locate_register(&part, "NOPE"),
            Err(QueryError::UnknownRegister { .. })
        ));
    }

    #[test]
    fn read_register_values() {
        let bs = bound(&[(5, 0x0000_00A5)]);
        let value = read_register(&bs, "CFG", Some((1, 0))).unwrap();
        assert_eq!(value.bits.len(), 8);
        assert_eq!(value.as_u64(), Some(0xA5));

        let first = read_register(&bs, "CFG", None).unwrap();
        assert_eq!(first.instance.frame.as_raw(), 1);
        assert_eq!(first.as_u64(), None);

        assert!(matches!(
            read_register(&bs, "CFG", Some((3, 3))),
            Err(QueryError::NoSuchInstance { row: 3, column: 3, .. })
        ));
    }
}
