//! Decoding of FPGA configuration bitstreams.
//!
//! This crate turns the raw bytes of a `.bit` file (or a headerless stream)
//! into a [`BitstreamContainer`]: the header metadata, the sequence of typed
//! configuration packets, and the frame table materialized by replaying the
//! packets against the frame address register.
//!
//! The main entry point is [`decode()`]; [`decode_many()`] decodes independent
//! inputs in parallel. Anomalies that do not prevent decoding are reported as
//! [`Diagnostics`](xylene_diagnostics::Diagnostics) alongside the container.

#![warn(missing_docs)]

pub mod batch;
#[cfg(any(test, feature = "test-support"))]
pub mod builder;
pub mod container;
pub mod crc;
pub mod error;
pub mod header;
pub mod packet;
pub mod reader;
pub mod replay;

pub use batch::decode_many;
pub use container::{BitstreamContainer, ConfigFrame, FrameTable};
pub use crc::{checksum_checks, ChecksumCheck, Crc32};
pub use error::DecodeError;
pub use header::BitHeader;
pub use packet::{Command, ConfigPacket, Opcode, PacketType, Register};
pub use reader::{decode, DecodeOptions, DEFAULT_SYNC_WINDOW};
pub use replay::{replay, ReplayContext, ReplayOutcome};
