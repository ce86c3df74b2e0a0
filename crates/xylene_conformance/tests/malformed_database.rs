//! Inconsistent catalogs are rejected at load time with `Malformed`.

use serde_json::{json, Value};
use xylene_conformance::REFERENCE_CATALOG;
use xylene_database::{Database, DatabaseError};

fn catalog() -> Value {
    serde_json::from_str(REFERENCE_CATALOG).unwrap()
}

fn load(catalog: &Value) -> Result<Database, DatabaseError> {
    Database::from_json_str(&catalog.to_string())
}

fn malformed(catalog: &Value) -> (String, String) {
    match load(catalog) {
        Err(DatabaseError::Malformed { part, reason }) => (part, reason),
        Err(other) => panic!("expected Malformed, got {other}"),
        Ok(_) => panic!("malformed catalog loaded"),
    }
}

#[test]
fn reference_catalog_loads() {
    let db = load(&catalog()).unwrap();
    assert_eq!(db.len(), 2);
}

#[test]
fn duplicate_idcode() {
    let mut c = catalog();
    c["parts"][1]["idcode"] = json!("0x01234093");
    let (part, reason) = malformed(&c);
    assert_eq!(part, "xy3r");
    assert!(reason.contains("already used by part 'xy2x2'"), "{reason}");
}

#[test]
fn unparseable_idcode() {
    let mut c = catalog();
    c["parts"][0]["idcode"] = json!("0xZZ");
    assert!(malformed(&c).1.contains("IDCODE"));
}

#[test]
fn frame_count_disagrees_with_grid() {
    let mut c = catalog();
    c["parts"][1]["frame_count"] = json!(32);
    let (part, reason) = malformed(&c);
    assert_eq!(part, "xy3r");
    assert!(reason.contains("lays out 33 frames"), "{reason}");
}

#[test]
fn ragged_grid_row_count() {
    let mut c = catalog();
    c["parts"][1]["rows"] = json!(2);
    assert!(malformed(&c).1.contains("rows"));
}

#[test]
fn grid_names_missing_column_type() {
    let mut c = catalog();
    c["parts"][1]["grid"][1][1] = json!("DSP");
    assert!(malformed(&c).1.contains("undefined column type 'DSP'"));
}

#[test]
fn unknown_block_type() {
    let mut c = catalog();
    c["parts"][0]["column_types"]["A"]["frames"]["dsp"] = json!(1);
    assert!(malformed(&c).1.contains("unknown block type 'dsp'"));
}

#[test]
fn register_outside_its_block() {
    let mut c = catalog();
    c["parts"][1]["registers"][0]["frame"] = json!(4);
    assert!(malformed(&c).1.contains("minor 4 out of range"));
}

#[test]
fn register_bits_past_frame_end() {
    let mut c = catalog();
    c["parts"][1]["registers"][2]["bits"] = json!([95, 97]);
    assert!(malformed(&c).1.contains("exceeds the 96-bit frame"));
}

#[test]
fn register_in_block_its_column_lacks() {
    let mut c = catalog();
    c["parts"][1]["registers"][1]["block"] = json!("clock");
    assert!(malformed(&c).1.contains("has no clock frames"));
}

#[test]
fn zero_words_per_frame() {
    let mut c = catalog();
    c["parts"][0]["words_per_frame"] = json!(0);
    assert!(malformed(&c).1.contains("words_per_frame"));
}

#[test]
fn unparseable_text_is_a_parse_error() {
    assert!(matches!(
        Database::from_json_str("{ \"parts\": [ { \"name\": "),
        Err(DatabaseError::Parse(_))
    ));
}
