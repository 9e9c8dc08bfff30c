//! Pre-built schemas, structures, and rows for common test scenarios.

use serde_json::{Value, json};

use crate::entry::Entry;
use crate::structure::{DataFormat, Structure};

/// Array-of-rows schema with four typed columns:
/// `id` (integer), `name` (string), `score` (number), `active` (boolean).
#[must_use]
pub fn people_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "array",
            "items": [
                {"title": "id", "type": "integer"},
                {"title": "name", "type": "string"},
                {"title": "score", "type": "number"},
                {"title": "active", "type": "boolean"}
            ]
        }
    })
}

/// A structure of `format` carrying [`people_schema`].
///
/// # Example
///
/// ```
/// use entryio::DataFormat;
/// use entryio::testing::people_structure;
///
/// let st = people_structure(DataFormat::Csv);
/// assert_eq!(st.columns().len(), 4);
/// ```
#[must_use]
pub fn people_structure(format: DataFormat) -> Structure {
    Structure::new(format).with_schema(people_schema())
}

/// Rows matching [`people_schema`].
#[must_use]
pub fn people_rows() -> Vec<Value> {
    vec![
        json!([1, "Ada", 98.5, true]),
        json!([2, "Grace", 87.25, false]),
        json!([3, "Linus", 77.0, true]),
    ]
}

/// [`people_rows`] as indexed entries.
#[must_use]
pub fn people_entries() -> Vec<Entry> {
    people_rows()
        .into_iter()
        .enumerate()
        .map(|(i, v)| Entry::indexed(i, v))
        .collect()
}

/// A structure of `format` rooted at `object`.
#[must_use]
pub fn keyed_structure(format: DataFormat) -> Structure {
    Structure::new(format).with_schema(json!({"type": "object"}))
}

/// Keyed entries with mixed value kinds. The keys share one length and
/// ascend, which is also canonical CBOR map order.
#[must_use]
pub fn keyed_entries() -> Vec<Entry> {
    vec![
        Entry::keyed(0, "alpha", json!(1)),
        Entry::keyed(1, "bravo", json!({"nested": [true, null]})),
        Entry::keyed(2, "gamma", json!("three")),
    ]
}
