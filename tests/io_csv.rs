use anyhow::Result;
use entryio::testing::*;
use entryio::*;
use serde_json::json;
use std::io::Cursor;

fn read_csv(st: &Structure, body: &str) -> Result<(Structure, Vec<Entry>)> {
    let mut reader = new_entry_reader(st, Cursor::new(body.to_string()))?;
    let entries = read_all(&mut reader)?;
    Ok((reader.structure().clone(), entries))
}

fn titles(st: &Structure) -> Vec<String> {
    st.columns().into_iter().map(|c| c.title).collect()
}

fn two_int_columns() -> Structure {
    Structure::new(DataFormat::Csv).with_schema(json!({
        "type": "array",
        "items": {"type": "array", "items": [
            {"title": "a", "type": "integer"},
            {"title": "b", "type": "integer"}
        ]}
    }))
}

#[test]
fn detects_header_and_column_types() -> Result<()> {
    let body = "Name,Age,Active\nada, 36,true\ngrace,45,false\n";
    let (st, entries) = read_csv(&Structure::new(DataFormat::Csv), body)?;

    let cfg = st.format_config.clone().unwrap_or_default();
    assert_eq!(cfg["headerRow"], json!(true));
    assert_eq!(cfg["variadicFields"], json!(false));

    let columns = st.columns();
    assert_eq!(titles(&st), ["name", "age", "active"]);
    assert_eq!(columns[1].ty, ValueType::Integer);
    assert_eq!(columns[2].ty, ValueType::Boolean);

    assert_values_equal(&entries, &[json!(["ada", 36, true]), json!(["grace", 45, false])]);
    Ok(())
}

#[test]
fn numeric_first_row_is_data() -> Result<()> {
    let (st, entries) = read_csv(&Structure::new(DataFormat::Csv), "1,2.5\n3,4\n")?;
    assert_eq!(st.format_config.clone().unwrap_or_default()["headerRow"], json!(false));
    assert_eq!(titles(&st), ["field_1", "field_2"]);
    assert_values_equal(&entries, &[json!([1, 2.5]), json!([3, 4.0])]);
    Ok(())
}

#[test]
fn detected_schema_keeps_minority_cells_as_text() -> Result<()> {
    let (st, entries) = read_csv(&Structure::new(DataFormat::Csv), "1\n2\nabc\n")?;
    assert_eq!(st.columns()[0].ty, ValueType::Integer);
    assert_values_equal(&entries, &[json!([1]), json!([2]), json!(["abc"])]);
    Ok(())
}

#[test]
fn detected_schema_accepts_rows_past_the_sample() -> Result<()> {
    let mut body: String = (0..2000).map(|i| format!("{i}\n")).collect();
    body.push_str("n/a\n");
    let (st, entries) = read_csv(&Structure::new(DataFormat::Csv), &body)?;
    assert_eq!(st.columns()[0].ty, ValueType::Integer);
    assert_eq!(entries.len(), 2001);
    assert_eq!(entries[1999].value, json!([1999]));
    assert_eq!(entries[2000].value, json!(["n/a"]));
    Ok(())
}

#[test]
fn inconsistent_field_counts_are_variadic() -> Result<()> {
    let (st, entries) = read_csv(&Structure::new(DataFormat::Csv), "1,2\n3\n4,5,6\n")?;
    assert_eq!(st.format_config.clone().unwrap_or_default()["variadicFields"], json!(true));
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].value, json!([3]));
    assert_eq!(entries[2].value, json!([4, 5, 6]));
    Ok(())
}

#[test]
fn field_count_mismatch_is_a_decode_error() -> Result<()> {
    let mut reader = new_entry_reader(&two_int_columns(), Cursor::new("1,2\n3\n"))?;
    assert_eq!(reader.read_entry()?.value, json!([1, 2]));
    let err = reader.read_entry().unwrap_err();
    assert!(matches!(err, Error::Decode { format: DataFormat::Csv, .. }), "{err}");
    Ok(())
}

#[test]
fn variadic_option_allows_short_records() -> Result<()> {
    let st = two_int_columns().with_format_option("variadicFields", true);
    let (_, entries) = read_csv(&st, "1,2\n3\n")?;
    assert_values_equal(&entries, &[json!([1, 2]), json!([3])]);
    Ok(())
}

#[test]
fn invalid_typed_cell_is_a_decode_error() -> Result<()> {
    let mut reader = new_entry_reader(&two_int_columns(), Cursor::new("1,x\n"))?;
    let err = reader.read_entry().unwrap_err();
    assert!(err.to_string().contains("invalid integer"), "{err}");
    Ok(())
}

#[test]
fn blank_typed_cells_are_null() -> Result<()> {
    let (_, entries) = read_csv(&two_int_columns(), "1,\n")?;
    assert_eq!(entries[0].value, json!([1, null]));
    Ok(())
}

#[test]
fn header_row_option_skips_first_record() -> Result<()> {
    let st = two_int_columns().with_format_option("headerRow", true);
    let (_, entries) = read_csv(&st, "a,b\n1,2\n")?;
    assert_values_equal(&entries, &[json!([1, 2])]);
    Ok(())
}

#[test]
fn solo_carriage_returns_split_records() -> Result<()> {
    let st = Structure::new(DataFormat::Csv).with_schema(json!({
        "type": "array",
        "items": {"type": "array", "items": [{"type": "string"}, {"type": "string"}]}
    }));
    let (_, entries) = read_csv(&st, "a,b\rc,d\r")?;
    assert_values_equal(&entries, &[json!(["a", "b"]), json!(["c", "d"])]);
    Ok(())
}

#[test]
fn custom_separator() -> Result<()> {
    let st = two_int_columns().with_format_option("separator", ";");
    let (_, entries) = read_csv(&st, "1;2\n")?;
    assert_eq!(entries[0].value, json!([1, 2]));

    let bad = two_int_columns().with_format_option("separator", "§");
    assert!(new_entry_reader(&bad, Cursor::new("")).is_err());
    Ok(())
}

#[test]
fn object_root_is_rejected() {
    let st = Structure::new(DataFormat::Csv).with_schema(json!({"type": "object"}));
    assert!(matches!(
        new_entry_reader(&st, Cursor::new("a,b\n")),
        Err(Error::InvalidRootType(_))
    ));
    assert!(matches!(
        new_entry_writer(&st, Vec::new()),
        Err(Error::InvalidRootType(_))
    ));
}

#[test]
fn writer_emits_header_and_orders_object_rows_by_column() -> Result<()> {
    let st = people_structure(DataFormat::Csv).with_format_option("headerRow", true);
    let bytes = encode_entries(
        &st,
        vec![
            Entry::indexed(0, json!({"active": true, "name": "Ada", "id": 1, "score": 98.5})),
            Entry::indexed(1, json!([2, "Grace", null, false])),
        ],
    )?;
    let text = String::from_utf8(bytes)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["id,name,score,active", "1,Ada,98.5,true", "2,Grace,,false"]);
    Ok(())
}

#[test]
fn writer_quotes_fields_and_serializes_nested_values() -> Result<()> {
    let st = Structure::new(DataFormat::Csv);
    let bytes = encode_entries(&st, vec![Entry::indexed(0, json!(["a,b", {"k": [1]}]))])?;
    let text = String::from_utf8(bytes)?;
    assert_eq!(text.trim_end(), r#""a,b","{""k"":[1]}""#);
    Ok(())
}

#[test]
fn object_rows_need_columns() {
    let st = Structure::new(DataFormat::Csv);
    let err = encode_entries(&st, vec![Entry::indexed(0, json!({"a": 1}))]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedValueShape(_)));
}

#[test]
fn people_roundtrip() -> Result<()> {
    let st = people_structure(DataFormat::Csv);
    let bytes = encode_entries(&st, people_entries())?;
    assert_entries_equal(decode_entries(&st, bytes)?, people_entries());
    Ok(())
}

#[test]
fn detection_helpers() -> Result<()> {
    let det = entryio::detect::detect_csv_schema(
        Cursor::new("id,id,2nd col\n1,2,x\n"),
        &CsvOptions::default(),
    )?;
    assert!(det.header_row);
    let names: Vec<&str> = det.schema["items"]["items"]
        .as_array()
        .map(|cols| cols.iter().filter_map(|c| c["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["id", "id_2", "_2nd_col"]);
    Ok(())
}
