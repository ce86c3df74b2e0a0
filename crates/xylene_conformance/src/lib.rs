//! Conformance test helpers for the Xylene bitstream tools.
//!
//! Provides the reference part catalogs, synthetic bitstreams built against
//! them, and pipeline functions that decode, bind and validate a stream and
//! return structured results for assertion in integration tests.

#![warn(missing_docs)]

use xylene_bitstream::builder::StreamBuilder;
use xylene_bitstream::{decode, BitstreamContainer, DecodeError, DecodeOptions};
use xylene_core::{validate_with_database, Bitstream, QueryError, ValidationPolicy};
use xylene_database::{Database, PartDescriptor};
use xylene_diagnostics::{DiagnosticKind, Diagnostics, Severity};

/// IDCODE of the scenario part.
pub const SCENARIO_IDCODE: u32 = 0x0123_4093;

/// IDCODE of the row-major reference part.
pub const ROWMAJOR_IDCODE: u32 = 0x0432_1093;

/// The reference catalog.
///
/// `xy2x2` is the scenario part: two rows of two type-`A` columns, four logic
/// frames per column, one word per frame, with `LUT_INIT` covering all of
/// minor 1 in every column. `xy3r` is a ragged row-major part with every
/// block type and three words per frame.
pub const REFERENCE_CATALOG: &str = r#"{
    "parts": [
        {
            "name": "xy2x2",
            "family": "xy-test",
            "idcode": "0x01234093",
            "words_per_frame": 1,
            "frame_count": 16,
            "rows": 2,
            "grid": [["A", "A"], ["A", "A"]],
            "column_types": {
                "A": { "description": "logic tile", "frames": { "logic": 4 } }
            },
            "registers": [
                {
                    "name": "LUT_INIT",
                    "description": "lookup table contents",
                    "column_type": "A",
                    "frame": 1,
                    "bits": [0, 32]
                }
            ]
        },
        {
            "name": "xy3r",
            "family": "xy-test",
            "idcode": "0x04321093",
            "words_per_frame": 3,
            "frame_count": 33,
            "major_order": "row-major",
            "rows": 3,
            "grid": [["L", "B", "L", "IO"], ["L", "CK"], ["IO", "L", "B"]],
            "column_types": {
                "L": { "frames": { "logic": 3 } },
                "B": { "frames": { "logic": 2, "block-ram": 4 } },
                "CK": { "frames": { "clock": 2, "special": 1 } },
                "IO": { "frames": { "logic": 1, "io": 2 } }
            },
            "registers": [
                { "name": "BRAM_WIDTH", "column_type": "B", "block": "block-ram",
                  "frame": 3, "bits": [40, 44] },
                { "name": "IO_STD", "column_type": "IO", "block": "io",
                  "frame": 1, "bits": [0, 5] },
                { "name": "GLOBAL_EN", "frame": 30, "bits": [95, 96] }
            ]
        }
    ]
}"#;

/// Loads the reference catalog.
pub fn reference_database() -> Database {
    Database::from_json_str(REFERENCE_CATALOG).unwrap()
}

/// Returns a reference part by name.
pub fn reference_part(name: &str) -> std::sync::Arc<PartDescriptor> {
    std::sync::Arc::clone(reference_database().lookup_name(name).unwrap())
}

/// The scenario stream: a `.bit` header and one word `0xDEADBEEF` written to
/// frame address 5 of `xy2x2`, with a valid CRC and a DESYNC.
pub fn scenario_builder() -> StreamBuilder {
    StreamBuilder::new()
        .with_header("scenario;UserID=0XFFFFFFFF", "xy2x2clg225-1")
        .rcrc()
        .idcode(SCENARIO_IDCODE)
        .wcfg()
        .far(5)
        .fdri(&[0xDEAD_BEEF])
        .crc()
        .desync()
}

/// The scenario stream's bytes.
pub fn scenario_stream() -> Vec<u8> {
    scenario_builder().build()
}

/// A stream writing every frame of `part` once with a position-derived pattern.
pub fn full_device_builder(part: &PartDescriptor) -> StreamBuilder {
    let words: Vec<u32> = (0..part.frame_count() as usize * part.words_per_frame())
        .map(|i| (i as u32).wrapping_mul(0x9E37_79B9))
        .collect();
    StreamBuilder::new()
        .with_header("full", part.name())
        .rcrc()
        .idcode(part.idcode().as_raw())
        .wcfg()
        .far(0)
        .fdri(&words)
        .crc()
        .desync()
}

/// Result of decoding, binding and validating one stream.
pub struct PipelineResult {
    /// The decoded container.
    pub container: BitstreamContainer,
    /// Diagnostics from decoding.
    pub decode_diagnostics: Diagnostics,
    /// The container bound to its part, or why binding failed.
    pub bound: Result<Bitstream, QueryError>,
    /// Diagnostics from validation.
    pub validation: Diagnostics,
}

impl PipelineResult {
    /// Returns the bound bitstream, panicking with the bind error otherwise.
    pub fn bitstream(&self) -> &Bitstream {
        match &self.bound {
            Ok(bs) => bs,
            Err(e) => panic!("stream did not bind: {e}"),
        }
    }

    /// Returns the number of fatal validation diagnostics.
    pub fn fatal_count(&self) -> usize {
        self.validation.count(Severity::Fatal)
    }
}

/// Decodes `bytes` against `db`, binds the result and validates it.
pub fn run_pipeline(
    bytes: &[u8],
    db: &Database,
    policy: &ValidationPolicy,
) -> Result<PipelineResult, DecodeError> {
    let options = DecodeOptions::default().with_database(db);
    let (container, decode_diagnostics) = decode(bytes, &options)?;
    let validation = validate_with_database(&container, db, policy);
    let bound = Bitstream::bind(container.clone(), db);
    Ok(PipelineResult {
        container,
        decode_diagnostics,
        bound,
        validation,
    })
}

/// Returns the kinds of a diagnostic list, in order.
pub fn kinds(diags: &Diagnostics) -> Vec<DiagnosticKind> {
    diags.iter().map(|d| d.kind).collect()
}
