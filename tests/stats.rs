use anyhow::Result;
use entryio::helpers::IdentityReader;
use entryio::stats::*;
use entryio::testing::*;
use entryio::*;
use serde_json::json;
use std::io::Cursor;

fn stats_of(data: serde_json::Value) -> Result<Option<Stats>> {
    let mut reader = IdentityReader::from_value(data)?;
    Ok(accumulate(&mut reader, StatsConfig::default())?)
}

#[test]
fn numeric_summary() -> Result<()> {
    let stats = stats_of(json!([1, 5, 3]))?.expect("three entries");
    let Stats::Numeric(n) = &stats else {
        panic!("expected numeric stats, got {stats:?}");
    };
    assert_eq!(n.count, 3);
    assert_eq!(n.min, serde_json::Number::from(1));
    assert_eq!(n.max, serde_json::Number::from(5));
    assert!((n.mean - 3.0).abs() < 1e-9);
    assert!((n.median.unwrap_or_default() - 3.0).abs() < 1e-9);

    let histogram = n.histogram.as_ref().expect("histogram for distinct values");
    assert_eq!(histogram.bins.len(), 11);
    assert_eq!(histogram.frequencies.len(), 10);
    assert_eq!(histogram.bins.first(), Some(&1.0));
    assert_eq!(histogram.bins.last(), Some(&5.0));

    let value = stats.to_value()?;
    assert_eq!(value["type"], json!("numeric"));
    assert_eq!(value["count"], json!(3));
    assert!(value.get("typeMismatches").is_none());
    Ok(())
}

#[test]
fn root_object_children_cover_every_key() -> Result<()> {
    let stats = stats_of(json!([{"a": 1}, {"b": 2}]))?.expect("two entries");
    assert_eq!(stats.count(), 2);
    let keys: Vec<Option<&str>> = stats.children().iter().map(|c| c.key.as_deref()).collect();
    assert_eq!(keys, [Some("a"), Some("b")]);
    assert_eq!(stats.child("a").map(Stats::count), Some(1));
    assert_eq!(stats.child("b").map(Stats::count), Some(1));
    assert!(stats.child("c").is_none());

    let value = stats.to_value()?;
    assert_eq!(value["type"], json!("object"));
    assert_eq!(value["values"][0]["key"], json!("a"));
    assert_eq!(value["values"][0]["type"], json!("numeric"));
    Ok(())
}

#[test]
fn strings_booleans_and_nulls() -> Result<()> {
    let stats = stats_of(json!([
        {"s": "apple", "b": true, "n": null},
        {"s": "fig", "b": false, "n": null},
        {"s": "apple", "b": true}
    ]))?
    .expect("entries");

    let Some(Stats::String(s)) = stats.child("s") else {
        panic!("expected string stats");
    };
    assert_eq!((s.count, s.min_length, s.max_length), (3, 3, 5));
    assert_eq!(s.unique, 2);
    assert_eq!(s.frequencies.get("apple"), Some(&2));
    assert_eq!(s.frequencies.get("fig"), Some(&1));

    let Some(Stats::Boolean(b)) = stats.child("b") else {
        panic!("expected boolean stats");
    };
    assert_eq!((b.count, b.true_count, b.false_count), (3, 2, 1));

    let Some(Stats::Null(n)) = stats.child("n") else {
        panic!("expected null stats");
    };
    assert_eq!(n.count, 2);
    Ok(())
}

#[test]
fn type_mismatches_are_reported() -> Result<()> {
    let stats = stats_of(json!([{"v": 1}, {"v": "two"}, {"v": 3}]))?.expect("entries");
    let value = stats.to_value()?;
    let v = &value["values"][0];
    assert_eq!(v["count"], json!(2));
    assert_eq!(v["typeMismatches"], json!(1));
    Ok(())
}

#[test]
fn rows_get_positional_children() -> Result<()> {
    let st = people_structure(DataFormat::Csv);
    let bytes = encode_entries(&st, people_entries())?;
    let mut reader = new_entry_reader(&st, Cursor::new(bytes))?;
    let stats = accumulate(&mut reader, StatsConfig::default())?.expect("rows");

    let Stats::Array(rows) = &stats else {
        panic!("expected array stats");
    };
    assert_eq!(rows.count, 3);
    let indices: Vec<Option<usize>> = rows.values.iter().map(|c| c.index).collect();
    assert_eq!(indices, [Some(0), Some(1), Some(2), Some(3)]);
    assert!(matches!(rows.values[2].stats, Stats::Numeric(_)));
    assert!(matches!(rows.values[3].stats, Stats::Boolean(_)));
    Ok(())
}

#[test]
fn empty_stream_has_no_stats() -> Result<()> {
    assert!(stats_of(json!([]))?.is_none());
    Ok(())
}

#[test]
fn accumulator_lifecycle() -> Result<()> {
    let st = Structure::new(DataFormat::Ndjson).with_schema(json!({"type": "array"}));
    let mut acc = Accumulator::new(&st);
    assert_eq!(acc.structure(), &st);
    acc.write_entry(Entry::indexed(0, json!(2.5)))?;
    assert!(acc.stats().is_none());
    assert!(!acc.is_closed());

    acc.close()?;
    assert!(acc.is_closed());
    assert_eq!(acc.stats().map(Stats::count), Some(1));
    acc.close()?;
    assert!(matches!(
        acc.write_entry(Entry::indexed(1, json!(1))),
        Err(Error::Closed(_))
    ));
    assert!(acc.into_stats().is_some());
    Ok(())
}

#[test]
fn config_bounds_frequencies() -> Result<()> {
    let config: StatsConfig = serde_json::from_value(json!({"topKCap": 2}))?;
    assert_eq!(config.histogram_bins, StatsConfig::default().histogram_bins);

    let values: Vec<serde_json::Value> = (0..50).map(|i| json!(format!("v{}", i % 10))).collect();
    let mut reader = IdentityReader::from_value(serde_json::Value::Array(values))?;
    let Some(Stats::String(s)) = accumulate(&mut reader, config)? else {
        panic!("expected string stats");
    };
    assert!(s.frequencies.len() <= 2);
    assert_eq!(s.unique, 10);
    Ok(())
}

#[test]
fn stats_deserialize_from_their_json_form() -> Result<()> {
    let stats = stats_of(json!([{"a": [1, "x"]}]))?.expect("one entry");
    let back: Stats = serde_json::from_value(stats.to_value()?)?;
    assert_eq!(back, stats);
    Ok(())
}
