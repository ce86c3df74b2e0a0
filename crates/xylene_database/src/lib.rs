//! The device database: an immutable catalog of known FPGA parts.
//!
//! Each [`PartDescriptor`] carries a part's geometry (rows, per-row column
//! types, frames per block type), its frame length, and a map of named
//! configuration registers. At load time every part precomputes a
//! [`FrameLayout`] that assigns each column a dense run of frame addresses.
//!
//! # Catalog files
//!
//! A catalog is a `{ "parts": [...] }` document stored as JSON, TOML, or an
//! [`XcmFile`] container. See [`catalog`] for the field layout.

#![warn(missing_docs)]

pub mod catalog;
pub mod db;
pub mod error;
pub mod layout;
pub mod part;
pub mod xcm;

pub use catalog::Catalog;
pub use db::{resolve_db_path, Database, DB_ENV_VAR};
pub use error::{DatabaseError, XcmError};
pub use layout::{FrameLayout, Segment};
pub use part::{BitRange, BlockType, ColumnType, MajorOrder, PartDescriptor, RegisterDef};
pub use xcm::{Compression, Content, XcmFile};
