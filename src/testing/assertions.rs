//! Assertions over entry streams.

use crate::entry::{Entry, EntryReader};

/// Assert that two entry sequences are equal, position by position.
///
/// # Panics
///
/// Panics with the first differing position when the sequences differ.
pub fn assert_entries_equal(actual: Vec<Entry>, expected: Vec<Entry>) {
    for (i, (a, e)) in actual.iter().zip(&expected).enumerate() {
        assert_eq!(a, e, "entries differ at position {i}");
    }
    assert_eq!(
        actual.len(),
        expected.len(),
        "entry counts differ: actual {} vs expected {}",
        actual.len(),
        expected.len()
    );
}

/// Assert that only the values of two entry sequences match, ignoring
/// indices and keys.
///
/// # Panics
///
/// Panics when the values differ.
pub fn assert_values_equal(actual: &[Entry], expected: &[serde_json::Value]) {
    let values: Vec<&serde_json::Value> = actual.iter().map(|e| &e.value).collect();
    let expected: Vec<&serde_json::Value> = expected.iter().collect();
    assert_eq!(values, expected);
}

/// Assert that `reader` is exhausted, and stays exhausted on a second read.
///
/// # Panics
///
/// Panics if either read returns an entry or an error other than the
/// end-of-entries sentinel.
pub fn assert_exhausted<R: EntryReader + ?Sized>(reader: &mut R) {
    for attempt in 0..2 {
        match reader.read_entry() {
            Ok(entry) => panic!("expected end of entries on read {attempt}, got {entry:?}"),
            Err(e) => assert!(e.is_end_of_entries(), "expected end of entries, got {e}"),
        }
    }
}
