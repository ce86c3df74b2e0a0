//! Decoding the same bytes twice gives identical results.

use xylene_bitstream::{decode, decode_many, DecodeOptions};
use xylene_conformance::{full_device_builder, reference_database, reference_part, scenario_stream};
use xylene_core::{validate_with_database, ValidationPolicy};

#[test]
fn repeated_decode_is_identical() {
    let db = reference_database();
    let bytes = scenario_stream();
    let options = DecodeOptions::default().with_database(&db);

    let (first, first_diags) = decode(&bytes, &options).unwrap();
    let (second, second_diags) = decode(&bytes, &options).unwrap();
    assert_eq!(first.frames(), second.frames());
    assert_eq!(first.packets(), second.packets());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first_diags, second_diags);
}

#[test]
fn repeated_validation_is_identical() {
    let db = reference_database();
    let (container, _) = decode(&scenario_stream(), &DecodeOptions::default()).unwrap();
    let policy = ValidationPolicy::default();
    let first = validate_with_database(&container, &db, &policy);
    let second = validate_with_database(&container, &db, &policy);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn batch_decode_matches_sequential_decode() {
    let db = reference_database();
    let inputs = vec![
        scenario_stream(),
        full_device_builder(&reference_part("xy2x2")).build(),
        full_device_builder(&reference_part("xy3r")).build(),
        Vec::new(),
    ];
    let options = DecodeOptions::default().with_database(&db);

    let batch = decode_many(&inputs, &options);
    assert_eq!(batch.len(), inputs.len());
    for (bytes, result) in inputs.iter().zip(&batch) {
        match (decode(bytes, &options), result) {
            (Ok((c1, d1)), Ok((c2, d2))) => {
                assert_eq!(c1.frames(), c2.frames());
                assert_eq!(c1.fingerprint(), c2.fingerprint());
                assert_eq!(&d1, d2);
            }
            (Err(e1), Err(e2)) => assert_eq!(e1.to_string(), e2.to_string()),
            (a, b) => panic!("batch and sequential decode disagree: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn fingerprint_tracks_input_bytes() {
    let a = scenario_stream();
    let mut b = a.clone();
    b.extend_from_slice(&[0, 0, 0, 0]);
    let options = DecodeOptions::default();
    let (ca, _) = decode(&a, &options).unwrap();
    let (cb, _) = decode(&b, &options).unwrap();
    assert_ne!(ca.fingerprint(), cb.fingerprint());
}
