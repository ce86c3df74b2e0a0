//! The reference scenario: one word written to frame 5 of a 2x2 part.

use xylene_common::FrameAddress;
use xylene_conformance::{kinds, reference_database, run_pipeline, scenario_stream};
use xylene_core::{
    describe_bit, frames_touched, read_register, BitMeaning, FrameLocation, PhysicalAddress,
    ReconfigScope, ValidationPolicy,
};
use xylene_database::BlockType;
use xylene_diagnostics::DiagnosticKind;

#[test]
fn scenario_touches_one_frame() {
    let db = reference_database();
    let result = run_pipeline(&scenario_stream(), &db, &ValidationPolicy::default()).unwrap();
    let touched = frames_touched(result.bitstream());
    let expected = FrameLocation {
        block: BlockType::Logic,
        row: 1,
        column: 0,
        minor: 1,
    };
    assert_eq!(touched.into_iter().collect::<Vec<_>>(), vec![expected]);
}

#[test]
fn scenario_bit_names_register() {
    let db = reference_database();
    let result = run_pipeline(&scenario_stream(), &db, &ValidationPolicy::default()).unwrap();
    let bs = result.bitstream();

    // 0xDEADBEEF has bit 0 set.
    let address = PhysicalAddress::new(FrameAddress::from_raw(5), 0, 0);
    match describe_bit(bs, address).unwrap() {
        BitMeaning::Mapped {
            register,
            index,
            value,
            coordinate,
            ..
        } => {
            assert_eq!(register, "LUT_INIT");
            assert_eq!(index, 0);
            assert_eq!(value, Some(true));
            assert_eq!((coordinate.row, coordinate.column, coordinate.minor), (1, 0, 1));
        }
        other => panic!("expected a mapped bit, got {other:?}"),
    }
}

#[test]
fn scenario_register_reads_written_word() {
    let db = reference_database();
    let result = run_pipeline(&scenario_stream(), &db, &ValidationPolicy::default()).unwrap();
    let value = read_register(result.bitstream(), "LUT_INIT", Some((1, 0))).unwrap();
    assert_eq!(value.as_u64(), Some(0xDEAD_BEEF));

    // Other instances were never written.
    let untouched = read_register(result.bitstream(), "LUT_INIT", Some((0, 1))).unwrap();
    assert_eq!(untouched.as_u64(), None);
}

#[test]
fn scenario_decodes_cleanly() {
    let db = reference_database();
    let result = run_pipeline(&scenario_stream(), &db, &ValidationPolicy::default()).unwrap();
    assert!(
        result.decode_diagnostics.is_empty(),
        "unexpected decode diagnostics: {:?}",
        kinds(&result.decode_diagnostics)
    );
    assert_eq!(result.container.header().design.as_deref(), Some("scenario;UserID=0XFFFFFFFF"));
    assert_eq!(result.bitstream().part().name(), "xy2x2");
}

#[test]
fn scenario_partial_column_is_a_coverage_gap() {
    let db = reference_database();
    let result = run_pipeline(&scenario_stream(), &db, &ValidationPolicy::default()).unwrap();

    // Frames 4, 6 and 7 of the touched column are missing, as two runs.
    assert_eq!(
        kinds(&result.validation),
        vec![DiagnosticKind::CoverageGap, DiagnosticKind::CoverageGap]
    );
    assert_eq!(result.fatal_count(), 0);
    assert_eq!(
        result.validation[0].location.frame,
        Some(FrameAddress::from_raw(4))
    );
    assert_eq!(
        result.validation[1].location.frame,
        Some(FrameAddress::from_raw(6))
    );
}

#[test]
fn device_scope_reports_both_sides_of_the_write() {
    let db = reference_database();
    let policy = ValidationPolicy::default().with_scope(ReconfigScope::Device);
    let result = run_pipeline(&scenario_stream(), &db, &policy).unwrap();
    assert_eq!(
        kinds(&result.validation),
        vec![DiagnosticKind::CoverageGap, DiagnosticKind::CoverageGap]
    );
    assert!(result.validation[1].message.contains("10 frames"));
}

#[test]
fn strict_validation_promotes_gaps() {
    let db = reference_database();
    let policy = ValidationPolicy::default().strict(true);
    let result = run_pipeline(&scenario_stream(), &db, &policy).unwrap();
    assert_eq!(result.fatal_count(), 2);
}
