//! CSV schema detection.
//!
//! Samples up to [`SAMPLE_ROWS`] records, decides whether the first record is
//! a header, names columns, and infers each column's type by majority vote
//! over [`parse_value_type`]. Both thresholds are behavioral contracts: the
//! sample size is 2000 rows and the boolean keywords are `true`/`false`.

use regex::Regex;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::io::Read;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::Result;
use crate::io::csv::{csv_record_reader, trimmed_fields};
use crate::structure::CsvOptions;
use crate::value::{ValueType, parse_integer, parse_number, parse_value_type};

/// Maximum number of records inspected when inferring a schema.
pub const SAMPLE_ROWS: usize = 2000;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid identifier regex"));

/// Outcome of sampling a CSV body.
#[derive(Clone, Debug, PartialEq)]
pub struct CsvDetection {
    /// `{"type":"array","items":{"type":"array","items":[{title,type}..]}}`
    pub schema: Value,
    /// First record was classified as a header.
    pub header_row: bool,
    /// Sampled records did not all have the same number of fields.
    pub variadic_fields: bool,
}

/// Whether `record` looks like a header row: every cell non-empty, and none
/// parses as an integer, a number, or one of the exact keywords `true` and
/// `false`.
#[must_use]
pub fn possible_header_row<S: AsRef<str>>(record: &[S]) -> bool {
    !record.is_empty()
        && record.iter().all(|cell| {
            let cell = cell.as_ref().trim();
            !cell.is_empty()
                && parse_integer(cell).is_none()
                && parse_number(cell).is_none()
                && !matches!(cell, "true" | "false")
        })
}

/// Turns arbitrary header text into a lower-case identifier.
///
/// Runs of non-word characters become `_`, a leading digit gets a `_`
/// prefix, and blank names become `field_{position}` (1-based).
#[must_use]
pub fn sanitize_identifier(raw: &str, position: usize) -> String {
    let replaced = NON_WORD.replace_all(raw.trim(), "_");
    let name = replaced.trim_matches('_').to_lowercase();
    if name.is_empty() {
        return format!("field_{}", position + 1);
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{name}");
    }
    name
}

/// Infers a schema from already-split records.
#[must_use]
pub fn detect_records(records: &[Vec<String>]) -> CsvDetection {
    let header_row = records.first().is_some_and(|r| possible_header_row(r.as_slice()));
    let data = if header_row { &records[1..] } else { records };

    let width = records.iter().map(Vec::len).max().unwrap_or(0);
    let variadic_fields = records
        .first()
        .is_some_and(|first| records.iter().any(|r| r.len() != first.len()));

    let mut seen = HashSet::new();
    let columns: Vec<Value> = (0..width)
        .map(|i| {
            let title = match records.first().and_then(|r| r.get(i)) {
                Some(cell) if header_row => unique_name(sanitize_identifier(cell, i), &mut seen),
                _ => unique_name(format!("field_{}", i + 1), &mut seen),
            };
            let ty = vote_column_type(data.iter().filter_map(|r| r.get(i)));
            json!({ "title": title, "type": ty.as_str() })
        })
        .collect();

    debug!(
        header_row,
        variadic_fields,
        columns = columns.len(),
        rows = data.len(),
        "detected csv schema"
    );

    CsvDetection {
        schema: json!({
            "type": "array",
            "items": { "type": "array", "items": columns },
        }),
        header_row,
        variadic_fields,
    }
}

/// Samples up to [`SAMPLE_ROWS`] records from `reader` and infers a schema.
///
/// # Errors
/// Malformed CSV or I/O failure.
pub fn detect_csv_schema<R: Read>(reader: R, options: &CsvOptions) -> Result<CsvDetection> {
    let mut rdr = csv_record_reader(reader, options);
    let mut records = Vec::new();
    let mut rec = csv::StringRecord::new();
    while records.len() < SAMPLE_ROWS && rdr.read_record(&mut rec)? {
        records.push(trimmed_fields(&rec));
    }
    Ok(detect_records(&records))
}

fn unique_name(name: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Most frequent non-blank type in a column. Mixed integer/number columns
/// widen to number; ties go to the earlier type in lattice precedence;
/// columns with no data are strings.
fn vote_column_type<'a>(cells: impl Iterator<Item = &'a String>) -> ValueType {
    const PRECEDENCE: [ValueType; 6] = [
        ValueType::Integer,
        ValueType::Number,
        ValueType::Boolean,
        ValueType::Object,
        ValueType::Array,
        ValueType::String,
    ];
    let mut counts = [0usize; PRECEDENCE.len()];
    for cell in cells {
        let ty = parse_value_type(cell.as_bytes());
        if let Some(slot) = PRECEDENCE.iter().position(|t| *t == ty) {
            counts[slot] += 1;
        }
    }
    if counts[0] > 0 && counts[1] > 0 {
        counts[1] += counts[0];
        counts[0] = 0;
    }
    let mut best = (ValueType::String, 0usize);
    for (ty, &count) in PRECEDENCE.iter().zip(counts.iter()) {
        if count > best.1 {
            best = (*ty, count);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn header_heuristic() {
        assert!(possible_header_row(&["name", "city", "notes"]));
        assert!(!possible_header_row(&["name", "1999"]));
        assert!(!possible_header_row(&["name", "2.5"]));
        assert!(!possible_header_row(&["name", "true"]));
        assert!(!possible_header_row(&["name", ""]));
        assert!(!possible_header_row::<&str>(&[]));
    }

    #[test]
    fn header_keywords_are_case_sensitive() {
        assert!(possible_header_row(&["TRUE", "False"]));
        assert!(!possible_header_row(&["false", "flag"]));
    }

    #[test]
    fn identifiers() {
        assert_eq!(sanitize_identifier("Total Sales ($)", 0), "total_sales");
        assert_eq!(sanitize_identifier("2020 count", 1), "_2020_count");
        assert_eq!(sanitize_identifier("  ", 2), "field_3");
    }

    #[test]
    fn majority_vote_and_widening() {
        let det = detect_records(&rows(&[
            &["id", "score", "label"],
            &["1", "2.5", "a"],
            &["2", "3", "b"],
            &["3", "4", "7"],
        ]));
        assert!(det.header_row);
        assert!(!det.variadic_fields);
        let cols = det.schema["items"]["items"].as_array().cloned().unwrap_or_default();
        let types: Vec<&str> = cols.iter().filter_map(|c| c["type"].as_str()).collect();
        assert_eq!(types, vec!["integer", "number", "string"]);
        assert_eq!(cols[0]["title"], "id");
    }

    #[test]
    fn duplicate_headers_and_variadic() {
        let det = detect_records(&rows(&[&["a", "a"], &["x", "y", "z"]]));
        assert!(det.variadic_fields);
        let cols = det.schema["items"]["items"].as_array().cloned().unwrap_or_default();
        let titles: Vec<&str> = cols.iter().filter_map(|c| c["title"].as_str()).collect();
        assert_eq!(titles, vec!["a", "a_2", "field_3"]);
    }
}
