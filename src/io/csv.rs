//! CSV entry reader and writer.
//!
//! The reader normalizes solo carriage returns to `\r\n`, splits records with
//! the `csv` crate (tolerant of stray quotes and uneven records), trims
//! leading whitespace from each field, and coerces fields to the schema's
//! column types. Without a schema it samples the first 2000 records through
//! [`crate::detect`], records `headerRow`/`variadicFields` into its
//! structure's `formatConfig`, and replays the sample. Cells that do not fit a
//! detected column type are kept as text; a declared schema is enforced
//! strictly.
//!
//! The writer emits one record per entry and has no closing bytes; `close`
//! flushes and finishes the output stream.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde_json::Value;
use std::collections::VecDeque;
use std::io::{self, Read};
use tracing::{debug, warn};

use crate::detect::{self, SAMPLE_ROWS};
use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::io::compression::FinishWrite;
use crate::structure::{Column, CsvOptions, DataFormat, RootType, Structure};
use crate::value::{ValueType, coerce_str, coerce_str_lossy, stringify};

/// Builds the record splitter shared by the reader and schema detection.
pub(crate) fn csv_record_reader<R: Read>(
    reader: R,
    options: &CsvOptions,
) -> csv::Reader<ReplaceSoloCarriageReturns<R>> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter())
        .from_reader(ReplaceSoloCarriageReturns::new(reader))
}

/// Fields of `rec` with leading whitespace removed.
pub(crate) fn trimmed_fields(rec: &StringRecord) -> Vec<String> {
    rec.iter().map(|f| f.trim_start().to_string()).collect()
}

/// Reads CSV records as array-valued entries.
pub struct CsvReader {
    st: Structure,
    records: csv::Reader<ReplaceSoloCarriageReturns<Box<dyn Read>>>,
    columns: Vec<Column>,
    variadic: bool,
    detected: bool,
    replay: VecDeque<Vec<String>>,
    index: usize,
}

impl CsvReader {
    /// # Errors
    /// Bad options, an object-rooted schema, or unreadable input while
    /// sampling for detection or skipping the header.
    pub fn new(st: &Structure, reader: Box<dyn Read>) -> Result<Self> {
        let mut st = st.clone();
        let mut options = CsvOptions::from_structure(&st)?;
        let mut records = csv_record_reader(reader, &options);
        let mut replay = VecDeque::new();
        let detected = st.schema.is_none();

        if detected {
            let mut sample = Vec::new();
            let mut rec = StringRecord::new();
            while sample.len() < SAMPLE_ROWS && records.read_record(&mut rec)? {
                sample.push(trimmed_fields(&rec));
            }
            let detection = detect::detect_records(&sample);
            st.schema = Some(detection.schema);
            st.set_format_option("headerRow", detection.header_row);
            st.set_format_option("variadicFields", detection.variadic_fields);
            if detection.variadic_fields {
                warn!("csv records have inconsistent field counts");
            }
            options.header_row = detection.header_row;
            options.variadic_fields = detection.variadic_fields;
            replay = sample.into();
            if detection.header_row {
                replay.pop_front();
            }
        } else if options.header_row {
            let mut rec = StringRecord::new();
            records.read_record(&mut rec)?;
        }

        if st.root_type()? == RootType::Object {
            return Err(Error::InvalidRootType(
                "object (csv records are unkeyed)".to_string(),
            ));
        }
        let columns = st.columns();
        debug!(columns = columns.len(), header_row = options.header_row, "csv reader ready");
        Ok(Self {
            st,
            records,
            columns,
            variadic: options.variadic_fields,
            detected,
            replay,
            index: 0,
        })
    }

    fn next_fields(&mut self) -> Result<Option<Vec<String>>> {
        if let Some(fields) = self.replay.pop_front() {
            return Ok(Some(fields));
        }
        let mut rec = StringRecord::new();
        if self.records.read_record(&mut rec)? {
            Ok(Some(trimmed_fields(&rec)))
        } else {
            Ok(None)
        }
    }

    fn to_value(&self, fields: Vec<String>) -> Result<Value> {
        if !self.variadic && !self.columns.is_empty() && fields.len() != self.columns.len() {
            return Err(Error::decode(
                DataFormat::Csv,
                format!(
                    "record {} has {} fields, schema declares {}",
                    self.index,
                    fields.len(),
                    self.columns.len()
                ),
            ));
        }
        let mut row = Vec::with_capacity(fields.len());
        for (i, field) in fields.into_iter().enumerate() {
            let (ty, title) = self
                .columns
                .get(i)
                .map_or((ValueType::String, ""), |c| (c.ty, c.title.as_str()));
            let blank_typed = field.is_empty() && !matches!(ty, ValueType::String | ValueType::Unknown);
            if blank_typed {
                row.push(Value::Null);
                continue;
            }
            if self.detected {
                row.push(coerce_str_lossy(&field, ty));
                continue;
            }
            let v = coerce_str(&field, ty).map_err(|message| {
                Error::decode(
                    DataFormat::Csv,
                    format!("record {} column {i} ({title}): {message}", self.index),
                )
            })?;
            row.push(v);
        }
        Ok(Value::Array(row))
    }
}

impl EntryReader for CsvReader {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        let Some(fields) = self.next_fields()? else {
            return Err(Error::EndOfEntries);
        };
        let value = self.to_value(fields)?;
        let entry = Entry::indexed(self.index, value);
        self.index += 1;
        Ok(entry)
    }
}

/// Writes array-valued (or column-keyed object) entries as CSV records.
pub struct CsvWriter {
    st: Structure,
    columns: Vec<Column>,
    writer: Option<csv::Writer<Box<dyn FinishWrite>>>,
}

impl CsvWriter {
    /// Writes the header row immediately when `headerRow` is set and the
    /// schema declares columns.
    ///
    /// # Errors
    /// Bad options, an object-rooted schema, or a failed header write.
    pub fn new(st: &Structure, writer: Box<dyn FinishWrite>) -> Result<Self> {
        let options = CsvOptions::from_structure(st)?;
        if st.schema.is_some() && st.root_type()? == RootType::Object {
            return Err(Error::InvalidRootType(
                "object (csv records are unkeyed)".to_string(),
            ));
        }
        let columns = st.columns();
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter())
            .from_writer(writer);
        if options.header_row && !columns.is_empty() {
            writer.write_record(columns.iter().map(|c| c.title.as_str()))?;
        }
        Ok(Self {
            st: st.clone(),
            columns,
            writer: Some(writer),
        })
    }

    fn record(&self, value: &Value) -> Result<Vec<String>> {
        match value {
            Value::Array(items) => Ok(items.iter().map(stringify).collect()),
            Value::Object(map) if !self.columns.is_empty() => Ok(self
                .columns
                .iter()
                .map(|c| map.get(&c.title).map(stringify).unwrap_or_default())
                .collect()),
            Value::Object(_) => Err(Error::UnsupportedValueShape(
                "object row without declared columns".to_string(),
            )),
            scalar => Ok(vec![stringify(scalar)]),
        }
    }
}

impl EntryWriter for CsvWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        let record = self.record(&entry.value)?;
        let writer = self.writer.as_mut().ok_or(Error::Closed("csv writer"))?;
        writer.write_record(&record)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            let output = writer
                .into_inner()
                .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))?;
            output.finish()?;
        }
        Ok(())
    }
}

/// Byte stream adapter that rewrites every `\r` not followed by `\n` into
/// `\r\n`, so classic-Mac line endings split into records.
pub struct ReplaceSoloCarriageReturns<R> {
    inner: R,
    chunk: Vec<u8>,
    out: Vec<u8>,
    pos: usize,
    pending_cr: bool,
    eof: bool,
}

impl<R> ReplaceSoloCarriageReturns<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk: vec![0; 8 * 1024],
            out: Vec::new(),
            pos: 0,
            pending_cr: false,
            eof: false,
        }
    }
}

impl<R: Read> Read for ReplaceSoloCarriageReturns<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.out.len() {
                let n = buf.len().min(self.out.len() - self.pos);
                buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.eof || buf.is_empty() {
                return Ok(0);
            }
            self.out.clear();
            self.pos = 0;
            let n = self.inner.read(&mut self.chunk)?;
            if n == 0 {
                self.eof = true;
                if self.pending_cr {
                    self.pending_cr = false;
                    self.out.extend_from_slice(b"\r\n");
                }
                continue;
            }
            for &b in &self.chunk[..n] {
                if self.pending_cr {
                    self.pending_cr = false;
                    self.out.extend_from_slice(b"\r\n");
                    if b == b'\n' {
                        continue;
                    }
                }
                if b == b'\r' {
                    self.pending_cr = true;
                } else {
                    self.out.push(b);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ReplaceSoloCarriageReturns::new(input)
            .read_to_end(&mut out)
            .expect("in-memory read");
        out
    }

    #[test]
    fn solo_carriage_returns() {
        assert_eq!(normalize(b"a\rb\r\nc\r"), b"a\r\nb\r\nc\r\n");
        assert_eq!(normalize(b"\r\r"), b"\r\n\r\n");
        assert_eq!(normalize(b"plain\n"), b"plain\n");
    }
}
