#![cfg(feature = "io-xlsx")]

use anyhow::Result;
use entryio::io::xlsx::{cell_name, column_name};
use entryio::testing::*;
use entryio::*;
use serde_json::json;
use std::io::Cursor;

fn sheet(columns: serde_json::Value) -> Structure {
    Structure::new(DataFormat::Xlsx).with_schema(json!({
        "type": "array",
        "items": {"type": "array", "items": columns}
    }))
}

#[test]
fn people_roundtrip() -> Result<()> {
    let st = people_structure(DataFormat::Xlsx);
    let bytes = encode_entries(&st, people_entries())?;
    assert!(bytes.starts_with(b"PK"));
    assert_entries_equal(decode_entries(&st, bytes)?, people_entries());
    Ok(())
}

#[test]
fn uncoercible_cells_keep_their_text() -> Result<()> {
    let st = sheet(json!([{"type": "integer"}, {"type": "boolean"}]));
    let bytes = encode_entries(&st, vec![Entry::indexed(0, json!(["abc", "maybe"]))])?;
    let rows = decode_entries(&st, bytes)?;
    assert_eq!(rows[0].value, json!(["abc", "maybe"]));
    Ok(())
}

#[test]
fn nested_columns_decode_their_json() -> Result<()> {
    let st = sheet(json!([{"type": "object"}, {"type": "array"}]));
    let bytes = encode_entries(
        &st,
        vec![
            Entry::indexed(0, json!([{"k": 1, "tags": ["a"]}, [1, "two", null]])),
            Entry::indexed(1, json!(["{oops", "[1,"])),
            Entry::indexed(2, json!(["[1]", "{}"])),
        ],
    )?;
    let rows = decode_entries(&st, bytes)?;
    assert_values_equal(
        &rows,
        &[
            json!([{"k": 1, "tags": ["a"]}, [1, "two", null]]),
            json!(["{oops", "[1,"]),
            json!(["[1]", "{}"]),
        ],
    );
    Ok(())
}

#[test]
fn null_columns_read_as_null() -> Result<()> {
    let st = sheet(json!([{"type": "null"}, {"type": "string"}]));
    let bytes = encode_entries(&st, vec![Entry::indexed(0, json!(["x", "y"]))])?;
    assert_eq!(decode_entries(&st, bytes)?[0].value, json!([null, "y"]));
    Ok(())
}

#[test]
fn gaps_and_object_rows() -> Result<()> {
    let st = sheet(json!([
        {"title": "a", "type": "string"},
        {"title": "b", "type": "string"},
        {"title": "c", "type": "string"}
    ]));
    let bytes = encode_entries(
        &st,
        vec![
            Entry::indexed(0, json!(["x", null, "z"])),
            Entry::indexed(1, json!({"c": "3", "a": "1"})),
        ],
    )?;
    let rows = decode_entries(&st, bytes)?;
    assert_values_equal(&rows, &[json!(["x", "", "z"]), json!(["1", "", "3"])]);
    Ok(())
}

#[test]
fn named_sheets() -> Result<()> {
    let st = people_structure(DataFormat::Xlsx).with_format_option("sheetName", "People");
    let bytes = encode_entries(&st, people_entries())?;
    assert_eq!(decode_entries(&st, bytes.clone())?.len(), 3);

    let missing = people_structure(DataFormat::Xlsx);
    assert!(matches!(
        new_entry_reader(&missing, Cursor::new(bytes)),
        Err(Error::Xlsx(_))
    ));
    Ok(())
}

#[test]
fn unsupported_shapes() {
    let st = sheet(json!([]));
    assert!(matches!(
        encode_entries(&st, vec![Entry::indexed(0, json!(5))]),
        Err(Error::UnsupportedValueShape(_))
    ));
    assert!(matches!(
        encode_entries(&st, vec![Entry::indexed(0, json!({"a": 1}))]),
        Err(Error::UnsupportedValueShape(_))
    ));

    let keyed = Structure::new(DataFormat::Xlsx).with_schema(json!({"type": "object"}));
    assert!(matches!(
        new_entry_writer(&keyed, Vec::new()),
        Err(Error::InvalidRootType(_))
    ));
}

#[test]
fn compression_is_rejected() {
    let st = people_structure(DataFormat::Xlsx).with_compression("gzip");
    assert!(matches!(
        new_entry_writer(&st, Vec::new()),
        Err(Error::UnsupportedCompression(_))
    ));
    assert!(matches!(
        new_entry_reader(&st, Cursor::new(Vec::new())),
        Err(Error::UnsupportedCompression(_))
    ));
}

#[test]
fn garbage_container() {
    let st = people_structure(DataFormat::Xlsx);
    assert!(new_entry_reader(&st, Cursor::new(b"not a workbook".to_vec())).is_err());
}

#[test]
fn cell_addresses() {
    assert_eq!(column_name(0), "A");
    assert_eq!(column_name(51), "AZ");
    assert_eq!(column_name(16_383), "XFD");
    assert_eq!(cell_name(2, 9), "C10");
}
