//! Inputs without a reachable sync word, or cut short, fail cleanly.

use xylene_bitstream::builder::StreamBuilder;
use xylene_bitstream::{decode, DecodeError, DecodeOptions, DEFAULT_SYNC_WINDOW};
use xylene_conformance::scenario_builder;

#[test]
fn empty_input_has_no_sync() {
    assert!(matches!(
        decode(&[], &DecodeOptions::default()),
        Err(DecodeError::SyncNotFound { .. })
    ));
}

#[test]
fn all_padding_has_no_sync() {
    let bytes = vec![0xFF; 4096];
    assert!(matches!(
        decode(&bytes, &DecodeOptions::default()),
        Err(DecodeError::SyncNotFound { .. })
    ));
}

#[test]
fn sync_beyond_the_window_is_not_found() {
    let body = StreamBuilder::new().rcrc().crc().desync().build();
    let mut bytes = vec![0xFF; DEFAULT_SYNC_WINDOW];
    bytes.extend_from_slice(&body);
    match decode(&bytes, &DecodeOptions::default()) {
        Err(DecodeError::SyncNotFound { window }) => assert_eq!(window, DEFAULT_SYNC_WINDOW),
        other => panic!("expected SyncNotFound, got {other:?}"),
    }

    // A wider window reaches it.
    let options = DecodeOptions::default().with_sync_window(bytes.len());
    assert!(decode(&bytes, &options).is_ok());
}

#[test]
fn cut_inside_frame_data_is_truncated() {
    let (bytes, frame_data) = StreamBuilder::new()
        .rcrc()
        .wcfg()
        .far(0)
        .fdri(&[1, 2, 3, 4])
        .crc()
        .desync()
        .build_with_layout();
    let range = frame_data[0].clone();
    for cut in range.start..range.end {
        match decode(&bytes[..cut], &DecodeOptions::default()) {
            Err(DecodeError::TruncatedStream { .. }) => {}
            other => panic!("cut at {cut}: expected TruncatedStream, got {other:?}"),
        }
    }
}

#[test]
fn cut_inside_header_field_is_truncated() {
    let bytes = scenario_builder().build();
    // The design name field starts after the 13-byte preamble and its key.
    let mut cut = bytes[..20].to_vec();
    // Keep the sync word reachable so the header itself is parsed.
    cut.extend_from_slice(&0xAA99_5566u32.to_be_bytes());
    assert!(matches!(
        decode(&cut, &DecodeOptions::default()),
        Err(DecodeError::TruncatedStream { .. })
    ));
}

#[test]
fn garbage_after_sync_desynchronizes() {
    let bytes = StreamBuilder::new().raw(0xE000_0001).build();
    assert!(matches!(
        decode(&bytes, &DecodeOptions::default()),
        Err(DecodeError::Desynchronized { word: 0xE000_0001, .. })
    ));
}
