use anyhow::Result;
use entryio::helpers::*;
use entryio::testing::*;
use entryio::*;
use serde_json::json;
use std::io::{Cursor, Read};

fn letters() -> Result<IdentityReader> {
    Ok(IdentityReader::from_value(json!([{"a": 1}, {"b": 2}, {"c": 3}, {"d": 4}]))?)
}

#[test]
fn paging_skips_then_limits() -> Result<()> {
    let mut page = PagedReader::new(letters()?, 1, Some(2));
    let entries = read_all(&mut page)?;
    assert_values_equal(&entries, &[json!({"b": 2}), json!({"c": 3})]);
    assert_eq!(entries[0].index, 1);
    assert_exhausted(&mut page);
    Ok(())
}

#[test]
fn paging_past_the_end() -> Result<()> {
    let mut page = PagedReader::new(letters()?, 3, Some(10));
    assert_values_equal(&read_all(&mut page)?, &[json!({"d": 4})]);

    let mut page = PagedReader::new(letters()?, 9, None);
    assert!(read_all(&mut page)?.is_empty());
    assert_exhausted(&mut page);

    let mut page = PagedReader::new(letters()?, 0, Some(0));
    assert_exhausted(&mut page);
    Ok(())
}

#[test]
fn paging_over_a_decoder() -> Result<()> {
    let st = Structure::new(DataFormat::Ndjson).with_schema(json!({"type": "array"}));
    let inner = new_entry_reader(&st, Cursor::new("1\n2\n3\n"))?;
    let mut page = PagedReader::new(inner, 2, None);
    assert_eq!(page.read_entry()?.value, json!(3));
    assert_eq!(page.into_inner().format(), DataFormat::Ndjson);
    Ok(())
}

#[test]
fn identity_reader_over_objects() -> Result<()> {
    let data = json!({"x": [1], "y": null});
    let mut reader = IdentityReader::from_value(data.clone())?;
    assert_eq!(reader.structure().root_type()?, RootType::Object);

    let mut sink = CollectingWriter::new(reader.structure())?;
    assert_eq!(copy(&mut reader, &mut sink)?, 2);
    sink.close()?;
    assert_eq!(sink.into_value(), data);
    Ok(())
}

#[test]
fn identity_reader_rejects_scalars_and_mismatched_roots() {
    assert!(matches!(
        IdentityReader::from_value(json!(1)),
        Err(Error::UnsupportedValueShape(_))
    ));
    let st = Structure::new(DataFormat::Json).with_schema(json!({"type": "object"}));
    assert!(IdentityReader::new(&st, json!([1])).is_err());
}

#[test]
fn identity_reader_close_ends_the_stream() -> Result<()> {
    let mut reader = letters()?;
    reader.read_entry()?;
    reader.close()?;
    assert_exhausted(&mut reader);
    Ok(())
}

#[test]
fn identity_writer_counts() -> Result<()> {
    let mut reader = letters()?;
    let mut writer = IdentityWriter::new(reader.structure());
    copy(&mut reader, &mut writer)?;
    writer.close()?;
    assert_eq!(writer.written(), 4);
    Ok(())
}

#[test]
fn collecting_writer_rejects_duplicate_keys() -> Result<()> {
    let mut sink = CollectingWriter::new(&keyed_structure(DataFormat::Json))?;
    sink.write_entry(Entry::keyed(0, "k", json!(1)))?;
    assert!(matches!(
        sink.write_entry(Entry::keyed(1, "k", json!(2))),
        Err(Error::DuplicateKey(_))
    ));
    Ok(())
}

#[test]
fn entry_buffer_reencodes_in_memory() -> Result<()> {
    let st = Structure::new(DataFormat::Json).with_schema(json!({"type": "array"}));
    let mut buffer = EntryBuffer::new(&st)?;
    buffer.write_entry(Entry::indexed(0, json!("a")))?;
    buffer.write_entry(Entry::indexed(1, json!({"n": 2})))?;

    let first = buffer.read_entry()?;
    assert_eq!(buffer.bytes(), b"[\"a\",\n{\"n\":2}\n]");
    assert_eq!(first.value, json!("a"));
    assert_eq!(buffer.read_entry()?.value, json!({"n": 2}));
    assert!(buffer.read_entry().unwrap_err().is_end_of_entries());

    assert!(matches!(
        buffer.write_entry(Entry::indexed(2, json!(3))),
        Err(Error::Closed(_))
    ));
    EntryReader::close(&mut buffer)?;
    assert!(matches!(buffer.read_entry(), Err(Error::Closed(_))));
    Ok(())
}

#[test]
fn entry_buffer_with_every_format() -> Result<()> {
    for format in [DataFormat::Csv, DataFormat::Json, DataFormat::Ndjson, DataFormat::Cbor] {
        let st = people_structure(format);
        let mut buffer = EntryBuffer::new(&st)?;
        for entry in people_entries() {
            buffer.write_entry(entry)?;
        }
        assert_entries_equal(read_all(&mut buffer)?, people_entries());
    }
    Ok(())
}

#[test]
fn shared_buffer_sees_every_write() {
    let sink = SharedBuffer::default();
    let mut handle = sink.clone();
    assert!(sink.is_empty());
    std::io::Write::write_all(&mut handle, b"abc").unwrap();
    assert_eq!(sink.len(), 3);
    assert_eq!(sink.to_vec(), b"abc");
}

#[test]
fn tracked_reader_counts_bytes() -> Result<()> {
    let mut tracked = TrackedReader::new(Cursor::new(b"0123456789".to_vec()));
    let mut head = [0u8; 4];
    tracked.read_exact(&mut head)?;
    assert_eq!(tracked.bytes_read(), 4);

    let mut rest = Vec::new();
    tracked.read_to_end(&mut rest)?;
    assert_eq!(tracked.bytes_read(), 10);
    assert_eq!(tracked.get_ref().position(), 10);
    assert_eq!(tracked.into_inner().into_inner().len(), 10);
    Ok(())
}

#[test]
fn tracked_reader_under_schema_detection() -> Result<()> {
    let body = b"name,qty\nbolt,4\nnut,9\n".to_vec();
    let len = body.len() as u64;
    let mut tracked = TrackedReader::new(Cursor::new(body));
    let detection = entryio::detect::detect_csv_schema(&mut tracked, &CsvOptions::default())?;
    assert!(detection.header_row);
    assert_eq!(tracked.bytes_read(), len);
    Ok(())
}
