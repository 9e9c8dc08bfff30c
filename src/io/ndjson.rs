//! Newline-delimited JSON entry reader and writer.
//!
//! One JSON value per `\n`-terminated line, no surrounding brackets. Blank
//! lines are skipped on read. Lines longer than `maxLineSize` (5 MiB by
//! default) are a decode error rather than an unbounded allocation.
//!
//! Object-rooted datasets put one single-member object `{"key":value}` on
//! each line.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::{BufRead, BufReader, BufWriter, IntoInnerError, Read, Write};
use tracing::debug;

use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::io::compression::FinishWrite;
use crate::structure::{DataFormat, NdjsonOptions, RootType, Structure};

fn decode_err(message: impl Into<String>) -> Error {
    Error::decode(DataFormat::Ndjson, message)
}

/// Reads one entry per line.
pub struct NdjsonReader {
    st: Structure,
    root: RootType,
    reader: BufReader<Box<dyn Read>>,
    max_line_size: usize,
    line: Vec<u8>,
    line_no: usize,
    index: usize,
}

impl NdjsonReader {
    /// # Errors
    /// [`Error::SchemaRequired`] / [`Error::InvalidRootType`], or bad options.
    pub fn new(st: &Structure, reader: Box<dyn Read>) -> Result<Self> {
        let root = st.root_type()?;
        let options = NdjsonOptions::from_structure(st)?;
        debug!(?root, max_line_size = options.max_line_size, "ndjson reader ready");
        Ok(Self {
            st: st.clone(),
            root,
            reader: BufReader::with_capacity(64 * 1024, reader),
            max_line_size: options.max_line_size,
            line: Vec::new(),
            line_no: 0,
            index: 0,
        })
    }

    fn next_line(&mut self) -> Result<bool> {
        loop {
            self.line.clear();
            let limit = self.max_line_size as u64 + 1;
            let n = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.line)?;
            if n == 0 {
                return Ok(false);
            }
            self.line_no += 1;
            if self.line.last() == Some(&b'\n') {
                self.line.pop();
            } else if self.line.len() > self.max_line_size {
                return Err(decode_err(format!(
                    "line {} exceeds {} bytes",
                    self.line_no, self.max_line_size
                )));
            }
            if !self.line.iter().all(u8::is_ascii_whitespace) {
                return Ok(true);
            }
        }
    }
}

impl EntryReader for NdjsonReader {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        if !self.next_line()? {
            return Err(Error::EndOfEntries);
        }
        let value: Value = serde_json::from_slice(&self.line)
            .map_err(|e| decode_err(format!("line {}: {e}", self.line_no)))?;
        let entry = match self.root {
            RootType::Array => Entry::indexed(self.index, value),
            RootType::Object => {
                let mut members = match value {
                    Value::Object(map) => map.into_iter(),
                    _ => Map::new().into_iter(),
                };
                match (members.next(), members.next()) {
                    (Some((key, value)), None) => Entry::keyed(self.index, key, value),
                    _ => {
                        return Err(decode_err(format!(
                            "line {}: object-rooted lines must be single-member objects",
                            self.line_no
                        )));
                    }
                }
            }
        };
        self.index += 1;
        Ok(entry)
    }
}

/// Writes one JSON value per line.
pub struct NdjsonWriter {
    st: Structure,
    root: RootType,
    writer: Option<BufWriter<Box<dyn FinishWrite>>>,
    keys: HashSet<String>,
}

impl NdjsonWriter {
    /// # Errors
    /// [`Error::SchemaRequired`] / [`Error::InvalidRootType`].
    pub fn new(st: &Structure, writer: Box<dyn FinishWrite>) -> Result<Self> {
        let root = st.root_type()?;
        Ok(Self {
            st: st.clone(),
            root,
            writer: Some(BufWriter::new(writer)),
            keys: HashSet::new(),
        })
    }
}

impl EntryWriter for NdjsonWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::Closed("ndjson writer"))?;
        let mut line = match self.root {
            RootType::Array => serde_json::to_vec(&entry.value)?,
            RootType::Object => {
                let key = entry.key.ok_or_else(|| {
                    Error::UnsupportedValueShape("object-rooted entry without a key".to_string())
                })?;
                if self.keys.contains(&key) {
                    return Err(Error::DuplicateKey(key));
                }
                let mut member = Map::new();
                member.insert(key.clone(), entry.value);
                let line = serde_json::to_vec(&member)?;
                self.keys.insert(key);
                line
            }
        };
        line.push(b'\n');
        writer.write_all(&line)?;
        Ok(())
    }

    /// Flushes and finishes the output stream, writing any compressor
    /// trailer.
    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.into_inner().map_err(IntoInnerError::into_error)?.finish()?;
        }
        Ok(())
    }
}
