//! Positions within a bitstream input that a diagnostic can point at.

use serde::{Deserialize, Serialize};
use std::fmt;
use xylene_common::FrameAddress;

/// Where in the input a diagnostic was observed.
///
/// Each coordinate is optional: a checksum mismatch names a packet and its
/// byte offset, a coverage gap names only a frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset into the raw input.
    pub byte_offset: Option<usize>,
    /// Index into the container's packet sequence.
    pub packet: Option<usize>,
    /// The frame address involved.
    pub frame: Option<FrameAddress>,
}

impl Location {
    /// A location carrying no position, for whole-input findings.
    pub const NONE: Location = Location {
        byte_offset: None,
        packet: None,
        frame: None,
    };

    /// A location at a raw byte offset.
    pub fn at_byte(offset: usize) -> Self {
        Self {
            byte_offset: Some(offset),
            ..Self::NONE
        }
    }

    /// A location at a packet and the byte offset of its header.
    pub fn at_packet(index: usize, offset: usize) -> Self {
        Self {
            byte_offset: Some(offset),
            packet: Some(index),
            frame: None,
        }
    }

    /// A location naming only a frame.
    pub fn at_frame(frame: FrameAddress) -> Self {
        Self {
            frame: Some(frame),
            ..Self::NONE
        }
    }

    /// Adds a frame address to this location.
    pub fn with_frame(mut self, frame: FrameAddress) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Returns `true` if no coordinate is set.
    pub fn is_none(&self) -> bool {
        self.byte_offset.is_none() && self.packet.is_none() && self.frame.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(packet) = self.packet {
            parts.push(format!("packet {packet}"));
        }
        if let Some(offset) = self.byte_offset {
            parts.push(format!("byte 0x{offset:X}"));
        }
        if let Some(frame) = self.frame {
            parts.push(format!("frame {frame}"));
        }
        if parts.is_empty() {
            write!(f, "<input>")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}
