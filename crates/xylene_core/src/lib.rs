//! Geometry-aware analysis of decoded bitstreams.
//!
//! The [`resolver`] translates between logical frame coordinates and the
//! dense physical address space of a part. [`validate()`] re-checks a decoded
//! container against a part without re-parsing it. The [`query`] functions
//! answer questions about a [`Bitstream`], a container bound to its part.

#![warn(missing_docs)]

pub mod bitstream;
pub mod error;
pub mod query;
pub mod resolver;
pub mod validate;

pub use bitstream::Bitstream;
pub use error::{QueryError, ResolveError};
pub use query::{
    describe_bit, diff, frames_outside, frames_touched, locate_register, read_register, BitChange,
    BitMeaning, FrameDiff, FrameDiffs, RegisterInstance, RegisterValue,
};
pub use resolver::{
    frame_address, locate_frame, to_logical, to_physical, FrameCoordinate, FrameLocation,
    PhysicalAddress,
};
pub use validate::{validate, validate_with_database, ReconfigScope, ValidationPolicy};

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;
    use xylene_database::{Database, PartDescriptor};

    /// Two rows of two `A` columns with four logic frames each, plus a
    /// ragged row-major part with mixed block types.
    pub const CATALOG: &str = r#"{
        "parts": [
            {
                "name": "xy2x2",
                "family": "test",
                "idcode": "0x01234093",
                "words_per_frame": 1,
                "frame_count": 16,
                "rows": 2,
                "grid": [["A", "A"], ["A", "A"]],
                "column_types": { "A": { "frames": { "logic": 4 } } },
                "registers": [
                    { "name": "CFG", "description": "column config",
                      "column_type": "A", "frame": 1, "bits": [0, 8] },
                    { "name": "GLOBAL", "frame": 15, "bits": [4, 6] }
                ]
            },
            {
                "name": "xyrag",
                "family": "test",
                "idcode": "0x04321093",
                "words_per_frame": 2,
                "frame_count": 12,
                "rows": 2,
                "major_order": "row-major",
                "grid": [["L", "M", "L"], ["M"]],
                "column_types": {
                    "L": { "frames": { "logic": 2 } },
                    "M": { "frames": { "logic": 1, "block-ram": 2, "io": 1 } }
                }
            }
        ]
    }"#;

    pub fn database() -> Database {
        Database::from_json_str(CATALOG).unwrap()
    }

    pub fn part(name: &str) -> Arc<PartDescriptor> {
        Arc::clone(database().lookup_name(name).unwrap())
    }
}
