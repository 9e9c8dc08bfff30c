//! Format dispatch.
//!
//! [`new_entry_reader`] and [`new_entry_writer`] pick the codec for a
//! structure's declared format exactly once, wrap the byte stream in the
//! structure's compression codec, and hand back a [`FormatReader`] /
//! [`FormatWriter`]: an enum over the concrete codecs that implements the
//! shared entry traits.
//!
//! ```
//! use entryio::io::{new_entry_reader, new_entry_writer};
//! use entryio::{DataFormat, Entry, EntryReader, EntryWriter, Structure};
//! use serde_json::json;
//! use std::io::Cursor;
//!
//! # fn main() -> entryio::Result<()> {
//! let st = Structure::new(DataFormat::Ndjson).with_schema(json!({"type": "array"}));
//! let sink = entryio::helpers::SharedBuffer::default();
//! let mut w = new_entry_writer(&st, sink.clone())?;
//! w.write_entry(Entry::indexed(0, json!({"a": 1})))?;
//! w.close()?;
//!
//! let mut r = new_entry_reader(&st, Cursor::new(sink.to_vec()))?;
//! assert_eq!(r.read_entry()?.value, json!({"a": 1}));
//! assert!(r.read_entry().unwrap_err().is_end_of_entries());
//! # Ok(())
//! # }
//! ```

pub mod cbor;
pub mod compression;
pub mod csv;
pub mod json;
pub mod ndjson;

#[cfg_attr(docsrs, doc(cfg(feature = "io-xlsx")))]
#[cfg(feature = "io-xlsx")]
pub mod xlsx;

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use self::cbor::{CborReader, CborWriter};
use self::csv::{CsvReader, CsvWriter};
use self::json::{JsonReader, JsonWriter};
use self::ndjson::{NdjsonReader, NdjsonWriter};
#[cfg(feature = "io-xlsx")]
use self::xlsx::{XlsxReader, XlsxWriter};
use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::structure::{DataFormat, Structure};

/// A reader for any supported format.
pub enum FormatReader {
    Csv(CsvReader),
    Json(JsonReader),
    Ndjson(NdjsonReader),
    Cbor(CborReader),
    #[cfg(feature = "io-xlsx")]
    Xlsx(XlsxReader),
}

/// A writer for any supported format.
pub enum FormatWriter {
    Csv(CsvWriter),
    Json(JsonWriter),
    Ndjson(NdjsonWriter),
    Cbor(CborWriter),
    #[cfg(feature = "io-xlsx")]
    Xlsx(XlsxWriter),
}

macro_rules! each_codec {
    ($value:expr, $codec:ident => $body:expr) => {
        match $value {
            Self::Csv($codec) => $body,
            Self::Json($codec) => $body,
            Self::Ndjson($codec) => $body,
            Self::Cbor($codec) => $body,
            #[cfg(feature = "io-xlsx")]
            Self::Xlsx($codec) => $body,
        }
    };
}

impl FormatReader {
    /// Format of the underlying codec.
    #[must_use]
    pub const fn format(&self) -> DataFormat {
        match self {
            Self::Csv(_) => DataFormat::Csv,
            Self::Json(_) => DataFormat::Json,
            Self::Ndjson(_) => DataFormat::Ndjson,
            Self::Cbor(_) => DataFormat::Cbor,
            #[cfg(feature = "io-xlsx")]
            Self::Xlsx(_) => DataFormat::Xlsx,
        }
    }
}

impl FormatWriter {
    /// Format of the underlying codec.
    #[must_use]
    pub const fn format(&self) -> DataFormat {
        match self {
            Self::Csv(_) => DataFormat::Csv,
            Self::Json(_) => DataFormat::Json,
            Self::Ndjson(_) => DataFormat::Ndjson,
            Self::Cbor(_) => DataFormat::Cbor,
            #[cfg(feature = "io-xlsx")]
            Self::Xlsx(_) => DataFormat::Xlsx,
        }
    }
}

impl EntryReader for FormatReader {
    fn structure(&self) -> &Structure {
        each_codec!(self, r => r.structure())
    }

    fn read_entry(&mut self) -> Result<Entry> {
        each_codec!(self, r => r.read_entry())
    }

    fn close(&mut self) -> Result<()> {
        each_codec!(self, r => r.close())
    }
}

impl EntryWriter for FormatWriter {
    fn structure(&self) -> &Structure {
        each_codec!(self, w => w.structure())
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        each_codec!(self, w => w.write_entry(entry))
    }

    fn close(&mut self) -> Result<()> {
        each_codec!(self, w => w.close())
    }
}

/// Construction-time checks shared by readers and writers.
///
/// CBOR and NDJSON need a schema. Any schema that is present must be rooted
/// at `array` or `object`.
fn check_structure(st: &Structure) -> Result<()> {
    match st.format {
        DataFormat::Unknown => return Err(Error::UnsupportedFormat("unknown".to_string())),
        #[cfg(not(feature = "io-xlsx"))]
        DataFormat::Xlsx => {
            return Err(Error::UnsupportedFormat(
                "xlsx (built without the io-xlsx feature)".to_string(),
            ));
        }
        DataFormat::Cbor | DataFormat::Ndjson => {
            st.root_type()?;
        }
        _ if st.schema.is_some() => {
            st.root_type()?;
        }
        _ => {}
    }
    Ok(())
}

/// Builds the reader for `st.format` over `reader`.
///
/// The stream is decompressed according to `st.compression` first.
///
/// # Errors
/// [`Error::UnsupportedFormat`], [`Error::SchemaRequired`],
/// [`Error::InvalidRootType`], [`Error::UnsupportedCompression`], or
/// whatever the codec reports while reading its header.
pub fn new_entry_reader<R: Read + 'static>(st: &Structure, reader: R) -> Result<FormatReader> {
    check_structure(st)?;
    debug!(format = %st.format, compression = ?st.compression_name(), "opening entry reader");
    let raw: Box<dyn Read> = Box::new(reader);
    #[cfg(feature = "io-xlsx")]
    if st.format == DataFormat::Xlsx {
        return Ok(FormatReader::Xlsx(XlsxReader::new(st, raw)?));
    }
    let input = compression::wrap_reader(st.compression_name(), raw)?;
    Ok(match st.format {
        DataFormat::Csv => FormatReader::Csv(CsvReader::new(st, input)?),
        DataFormat::Json => FormatReader::Json(JsonReader::new(st, input)?),
        DataFormat::Ndjson => FormatReader::Ndjson(NdjsonReader::new(st, input)?),
        DataFormat::Cbor => FormatReader::Cbor(CborReader::new(st, input)?),
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    })
}

/// Builds the writer for `st.format` over `writer`.
///
/// The stream is compressed according to `st.compression`; the compressor's
/// trailer is written when the returned writer is closed.
///
/// # Errors
/// As [`new_entry_reader`], plus codec-specific header write failures.
pub fn new_entry_writer<W: Write + 'static>(st: &Structure, writer: W) -> Result<FormatWriter> {
    check_structure(st)?;
    debug!(format = %st.format, compression = ?st.compression_name(), "opening entry writer");
    let raw: Box<dyn Write> = Box::new(writer);
    #[cfg(feature = "io-xlsx")]
    if st.format == DataFormat::Xlsx {
        return Ok(FormatWriter::Xlsx(XlsxWriter::new(st, raw)?));
    }
    let output = compression::wrap_writer(st.compression_name(), raw)?;
    Ok(match st.format {
        DataFormat::Csv => FormatWriter::Csv(CsvWriter::new(st, output)?),
        DataFormat::Json => FormatWriter::Json(JsonWriter::new(st, output)?),
        DataFormat::Ndjson => FormatWriter::Ndjson(NdjsonWriter::new(st, output)?),
        DataFormat::Cbor => FormatWriter::Cbor(CborWriter::new(st, output)?),
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    })
}

/// Opens the file at `path` and builds a reader over it.
///
/// # Errors
/// As [`new_entry_reader`], plus failure to open the file.
pub fn open_entry_reader(st: &Structure, path: impl AsRef<Path>) -> Result<FormatReader> {
    let file = File::open(path.as_ref())?;
    new_entry_reader(st, BufReader::new(file))
}

/// Creates the file at `path` (and any missing parent directories) and
/// builds a writer over it.
///
/// # Errors
/// As [`new_entry_writer`], plus failure to create the file.
pub fn create_entry_writer(st: &Structure, path: impl AsRef<Path>) -> Result<FormatWriter> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    new_entry_writer(st, BufWriter::new(file))
}
