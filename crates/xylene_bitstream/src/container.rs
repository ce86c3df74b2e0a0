//! The decoded bitstream container and its frame table.

use crate::header::BitHeader;
use crate::packet::{ConfigPacket, Register};
use crate::replay::{replay, ReplayContext};
use serde::Serialize;
use std::collections::{btree_map, BTreeMap};
use std::sync::Arc;
use xylene_common::{ContentHash, FrameAddress, IdCode};
use xylene_database::PartDescriptor;
use xylene_diagnostics::Diagnostics;

/// A single configuration frame containing packed 32-bit words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFrame {
    /// The address of this frame.
    pub address: FrameAddress,
    /// Packed 32-bit words forming the frame data.
    pub data: Vec<u32>,
}

impl ConfigFrame {
    /// Returns the bit at a frame-relative offset (`word * 32 + bit`, bit 0 = LSB).
    pub fn bit(&self, offset: u32) -> Option<bool> {
        let word = self.data.get((offset / 32) as usize)?;
        Some((word >> (offset % 32)) & 1 == 1)
    }
}

/// Frames materialized by replay, ordered by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTable {
    frames: BTreeMap<FrameAddress, ConfigFrame>,
}

impl FrameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a frame, returning `true` if one was already present at its address.
    pub fn insert(&mut self, frame: ConfigFrame) -> bool {
        self.frames.insert(frame.address, frame).is_some()
    }

    /// Returns the frame at `address`.
    pub fn get(&self, address: FrameAddress) -> Option<&ConfigFrame> {
        self.frames.get(&address)
    }

    /// Returns `true` if a frame is present at `address`.
    pub fn contains(&self, address: FrameAddress) -> bool {
        self.frames.contains_key(&address)
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame was written.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterates over frames in ascending address order.
    pub fn iter(&self) -> btree_map::Values<'_, FrameAddress, ConfigFrame> {
        self.frames.values()
    }

    /// Iterates over frame addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = FrameAddress> + '_ {
        self.frames.keys().copied()
    }
}

/// Everything decoded from one bitstream input.
///
/// Built by [`decode`](crate::decode) and immutable afterwards.
#[derive(Debug, Clone)]
pub struct BitstreamContainer {
    pub(crate) header: BitHeader,
    pub(crate) sync_offset: usize,
    pub(crate) packets: Vec<ConfigPacket>,
    pub(crate) idcode: Option<IdCode>,
    pub(crate) frames: FrameTable,
    pub(crate) frame_words: Option<usize>,
    pub(crate) part: Option<Arc<PartDescriptor>>,
    pub(crate) fingerprint: ContentHash,
}

impl BitstreamContainer {
    /// Returns the `.bit` header fields.
    pub fn header(&self) -> &BitHeader {
        &self.header
    }

    /// Returns the byte offset of the sync word.
    pub fn sync_offset(&self) -> usize {
        self.sync_offset
    }

    /// Returns the packets in stream order.
    pub fn packets(&self) -> &[ConfigPacket] {
        &self.packets
    }

    /// Returns the last value written to the CRC register.
    pub fn stated_checksum(&self) -> Option<u32> {
        self.packets
            .iter()
            .rev()
            .find(|p| p.writes(Register::Crc))
            .and_then(|p| p.payload.last().copied())
    }

    /// Returns the IDCODE embedded in the stream.
    pub fn idcode(&self) -> Option<IdCode> {
        self.idcode
    }

    /// Returns the materialized frames.
    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Returns the frame length used to split frame data, if one was known.
    pub fn frame_words(&self) -> Option<usize> {
        self.frame_words
    }

    /// Returns the part bound during decoding.
    pub fn part(&self) -> Option<&Arc<PartDescriptor>> {
        self.part.as_ref()
    }

    /// Returns the XXH3-128 fingerprint of the input bytes.
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    /// Replays the stored packets against `part`, rebuilding the frame table.
    ///
    /// Used when binding a container decoded without (or with a different)
    /// part. The returned diagnostics cover the replay only.
    pub fn rematerialize(&self, part: &Arc<PartDescriptor>) -> (BitstreamContainer, Diagnostics) {
        let ctx = ReplayContext {
            frame_words: None,
            part: Some(Arc::clone(part)),
            database: None,
        };
        let outcome = replay(&self.packets, &ctx);
        let container = BitstreamContainer {
            frames: outcome.frames,
            frame_words: outcome.frame_words,
            part: outcome.part,
            ..self.clone()
        };
        (container, outcome.diagnostics)
    }
}
