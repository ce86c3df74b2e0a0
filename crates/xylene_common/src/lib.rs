//! Shared foundational types used across the Xylene bitstream documentation tools.
//!
//! This crate provides the configuration-memory identifiers ([`FrameAddress`],
//! [`IdCode`]), content fingerprints for input files, and the IEC/SI byte-size
//! helpers used by size-valued settings.

#![warn(missing_docs)]

pub mod hash;
pub mod ids;
pub mod units;

pub use hash::ContentHash;
pub use ids::{FrameAddress, IdCode, ParseIdCodeError};
pub use units::{ByteSize, ParseByteSizeError};
