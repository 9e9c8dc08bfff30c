//! Every reader reports exhaustion the same way, and keeps reporting it.

use anyhow::Result;
use entryio::helpers::{EntryBuffer, IdentityReader, PagedReader};
use entryio::testing::*;
use entryio::*;
use serde_json::json;
use std::io::Cursor;

fn formats() -> Vec<DataFormat> {
    let mut formats = vec![DataFormat::Csv, DataFormat::Json, DataFormat::Ndjson, DataFormat::Cbor];
    if cfg!(feature = "io-xlsx") {
        formats.push(DataFormat::Xlsx);
    }
    formats
}

#[test]
fn empty_bodies_are_exhausted_immediately() -> Result<()> {
    for format in formats() {
        let st = people_structure(format);
        let bytes = encode_entries(&st, Vec::new())?;
        let mut reader = new_entry_reader(&st, Cursor::new(bytes))?;
        assert_eq!(each_entry(&mut reader, |_, _| Ok(()))?, 0, "{format}");
        assert_exhausted(&mut reader);
    }
    Ok(())
}

#[test]
fn drained_readers_stay_drained() -> Result<()> {
    for format in formats() {
        let st = people_structure(format);
        let bytes = encode_entries(&st, people_entries())?;
        let mut reader = new_entry_reader(&st, Cursor::new(bytes))?;
        assert_eq!(read_all(&mut reader)?.len(), 3, "{format}");
        assert_exhausted(&mut reader);
    }
    Ok(())
}

#[test]
fn helpers_share_the_sentinel() -> Result<()> {
    let mut identity = IdentityReader::from_value(json!([]))?;
    assert_exhausted(&mut identity);

    let mut page = PagedReader::new(IdentityReader::from_value(json!([1]))?, 1, None);
    assert_exhausted(&mut page);

    let mut buffer = EntryBuffer::new(&people_structure(DataFormat::Ndjson))?;
    assert_exhausted(&mut buffer);
    Ok(())
}

#[test]
fn sentinel_survives_positional_context() {
    let wrapped = Error::EndOfEntries.at_entry(7);
    assert!(matches!(wrapped, Error::EndOfEntries));

    let nested = Error::AtEntry {
        index: 1,
        source: Box::new(Error::EndOfEntries),
    };
    assert!(nested.is_end_of_entries());

    let real = Error::Closed("reader").at_entry(3);
    assert!(!real.is_end_of_entries());
    assert_eq!(real.to_string(), "entry 3: reader is closed");
}

#[test]
fn drive_loops_tag_errors_with_the_entry_index() -> Result<()> {
    let st = Structure::new(DataFormat::Ndjson).with_schema(json!({"type": "array"}));
    let mut reader = new_entry_reader(&st, Cursor::new("1\n2\nnope\n"))?;
    let err = read_all(&mut reader).unwrap_err();
    assert!(matches!(err, Error::AtEntry { index: 2, .. }), "{err}");

    let mut reader = new_entry_reader(&st, Cursor::new("1\n2\n"))?;
    let err = each_entry(&mut reader, |i, _| {
        if i == 1 {
            Err(Error::UnsupportedValueShape("stop".to_string()))
        } else {
            Ok(())
        }
    })
    .unwrap_err();
    assert!(matches!(err, Error::AtEntry { index: 1, .. }));
    Ok(())
}

#[test]
fn iterator_view() -> Result<()> {
    let st = Structure::new(DataFormat::Ndjson).with_schema(json!({"type": "array"}));
    let mut reader = new_entry_reader(&st, Cursor::new("1\n2\nnope\n3\n"))?;
    let results: Vec<_> = entries(&mut reader).collect();
    assert_eq!(results.len(), 3);
    assert!(results[..2].iter().all(|r| r.is_ok()));
    assert!(results[2].is_err());

    let mut reader = new_entry_reader(&st, Cursor::new("1\n2\n"))?;
    let sum: i64 = entries(&mut reader)
        .map(|e| e.map(|e| e.value.as_i64().unwrap_or_default()))
        .sum::<entryio::Result<i64>>()?;
    assert_eq!(sum, 3);
    Ok(())
}
