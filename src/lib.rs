//! # entryio
//!
//! Read and write tabular and tree-shaped datasets as a uniform stream of
//! **entries**, whatever the on-disk encoding, and summarize any entry
//! stream with streaming descriptive statistics.
//!
//! ## Key Features
//!
//! - **One reader/writer abstraction** - every codec implements
//!   [`EntryReader`] and [`EntryWriter`]
//! - **Five encodings** - CSV, JSON, NDJSON, CBOR (canonical on write), and
//!   XLSX (feature: `io-xlsx`)
//! - **Pluggable compression** - gzip, zstd, bzip2, and xz, chosen by name
//! - **Stream utilities** - byte tracking, paging, in-memory re-encoding,
//!   and readers/writers over native values
//! - **Streaming statistics** - per-field counts, ranges, means, medians,
//!   histograms, cardinality, and top values
//!
//! ## Quick Start
//!
//! ```
//! use entryio::*;
//! use serde_json::json;
//! use std::io::Cursor;
//!
//! # fn main() -> Result<()> {
//! let st = Structure::new(DataFormat::Csv).with_schema(json!({
//!     "type": "array",
//!     "items": {"type": "array", "items": [
//!         {"title": "name", "type": "string"},
//!         {"title": "age", "type": "integer"}
//!     ]}
//! }));
//!
//! let mut reader = new_entry_reader(&st, Cursor::new("name,age\nada,36\n"))?;
//! let rows = read_all(&mut reader)?;
//! assert_eq!(rows[0].value, json!(["ada", 36]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Structure
//!
//! A [`Structure`] names the format, optional `formatConfig` options, the
//! schema, and the compression of a dataset body. The schema's root `type`
//! decides whether entries are indexed rows (`array`) or keyed members
//! (`object`).
//!
//! ### End of entries
//!
//! Readers report exhaustion with [`Error::EndOfEntries`]. Loops should use
//! [`Error::is_end_of_entries`], or drive readers through [`each_entry`],
//! [`copy`], [`entries`], or [`read_all`], which all stop on it cleanly.
//!
//! ### Statistics
//!
//! [`stats::Accumulator`] is itself an [`EntryWriter`]: copy any reader into
//! it and ask for the resulting [`stats::Stats`] tree.
//!
//! ## Feature Flags
//!
//! - `io-xlsx` - XLSX workbooks via `calamine` and `rust_xlsxwriter`
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`,
//!   `compression-xz` - compression codecs
//!
//! ## Module Overview
//!
//! - [`structure`] - Dataset descriptor and per-format options
//! - [`entry`] - Entries, reader/writer traits, and drive loops
//! - [`io`] - Codecs and the format dispatcher
//! - [`helpers`] - Stream utilities
//! - [`stats`] - Streaming statistics
//! - [`sketch`] - Bounded-memory sketches backing the statistics
//! - [`detect`] - CSV header and column type detection
//! - [`testing`] - Fixtures and assertions for tests

pub mod detect;
pub mod entry;
pub mod error;
pub mod helpers;
pub mod io;
pub mod sketch;
pub mod stats;
pub mod structure;
pub mod testing;
pub mod value;

// Re-exports
pub use entry::{Entry, EntryReader, EntryWriter, copy, each_entry, entries, read_all};
pub use error::{Error, Result};
pub use io::{
    FormatReader, FormatWriter, create_entry_writer, new_entry_reader, new_entry_writer,
    open_entry_reader,
};
pub use stats::{Accumulator, Stats, StatsConfig, accumulate};
pub use structure::{
    Column, CsvOptions, DataFormat, NdjsonOptions, RootType, Structure, XlsxOptions,
};
pub use value::{Map, Value, ValueType};
