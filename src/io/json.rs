//! JSON entry reader and writer.
//!
//! The reader never builds a parse tree for the whole document. It consumes
//! the outer `[`, then scans forward one member at a time, tracking bracket
//! depth (and string literals, so brackets inside strings do not count).
//! Each member's raw bytes are decoded on their own. A `]` at depth zero ends
//! the stream. Only array-rooted documents can be read.
//!
//! The writer streams `[`, then members separated by `,\n`, and closes with
//! `\n]`, or `[]` when nothing was written. Object-rooted writers emit
//! `{"key":value,...}` and reject duplicate keys.

use serde_json::Value;
use std::collections::HashSet;
use std::io::{BufRead, BufReader, BufWriter, IntoInnerError, Read, Write};
use tracing::debug;

use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::io::compression::FinishWrite;
use crate::structure::{Column, DataFormat, RootType, Structure};

fn decode_err(message: impl Into<String>) -> Error {
    Error::decode(DataFormat::Json, message)
}

/// Root type of `st`, defaulting to array when there is no schema.
pub(crate) fn root_or_array(st: &Structure) -> Result<RootType> {
    if st.schema.is_none() {
        return Ok(RootType::Array);
    }
    st.root_type()
}

/// Streams members of a top-level JSON array as entries.
pub struct JsonReader {
    st: Structure,
    reader: BufReader<Box<dyn Read>>,
    started: bool,
    done: bool,
    after_member: bool,
    after_comma: bool,
    index: usize,
}

impl JsonReader {
    /// # Errors
    /// [`Error::InvalidRootType`] unless the root type is `array`.
    pub fn new(st: &Structure, reader: Box<dyn Read>) -> Result<Self> {
        if root_or_array(st)? == RootType::Object {
            return Err(Error::InvalidRootType(
                "object (json reader only scans array-rooted documents)".to_string(),
            ));
        }
        Ok(Self {
            st: st.clone(),
            reader: BufReader::new(reader),
            started: false,
            done: false,
            after_member: false,
            after_comma: false,
            index: 0,
        })
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    fn bump(&mut self) -> Result<u8> {
        let b = self
            .peek()?
            .ok_or_else(|| decode_err("unexpected end of input"))?;
        self.reader.consume(1);
        Ok(b)
    }

    fn skip_whitespace(&mut self) -> Result<Option<u8>> {
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                return Ok(Some(b));
            }
            self.reader.consume(1);
        }
        Ok(None)
    }

    fn open(&mut self) -> Result<()> {
        match self.skip_whitespace()? {
            Some(b'[') => {
                self.reader.consume(1);
                self.started = true;
                Ok(())
            }
            Some(b) => Err(decode_err(format!(
                "invalid top-level character {:?}, expected '['",
                char::from(b)
            ))),
            None => Err(decode_err("unexpected end of input before '['")),
        }
    }

    /// Copies a string literal (opening quote already pushed) into `token`.
    fn scan_string(&mut self, token: &mut Vec<u8>) -> Result<()> {
        loop {
            let b = self.bump()?;
            token.push(b);
            match b {
                b'\\' => token.push(self.bump()?),
                b'"' => return Ok(()),
                _ => {}
            }
        }
    }

    /// Collects the raw bytes of one array member.
    fn scan_member(&mut self, first: u8) -> Result<Vec<u8>> {
        let mut token = Vec::new();
        match first {
            b'{' | b'[' => {
                let mut depth = 0usize;
                loop {
                    let b = self.bump()?;
                    token.push(b);
                    match b {
                        b'{' | b'[' => depth += 1,
                        b'}' | b']' => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(token);
                            }
                        }
                        b'"' => self.scan_string(&mut token)?,
                        _ => {}
                    }
                }
            }
            b'"' => {
                token.push(self.bump()?);
                self.scan_string(&mut token)?;
                Ok(token)
            }
            _ => {
                while let Some(b) = self.peek()? {
                    if b == b',' || b == b']' || b.is_ascii_whitespace() {
                        break;
                    }
                    token.push(b);
                    self.reader.consume(1);
                }
                Ok(token)
            }
        }
    }
}

impl EntryReader for JsonReader {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        if self.done {
            return Err(Error::EndOfEntries);
        }
        if !self.started {
            self.open()?;
        }
        loop {
            let b = self
                .skip_whitespace()?
                .ok_or_else(|| decode_err("unexpected end of input, expected ']'"))?;
            match b {
                b']' if self.after_comma => {
                    return Err(decode_err(format!("trailing comma after member {}", self.index - 1)));
                }
                b']' => {
                    self.reader.consume(1);
                    self.done = true;
                    return Err(Error::EndOfEntries);
                }
                b',' if self.after_member => {
                    self.reader.consume(1);
                    self.after_member = false;
                    self.after_comma = true;
                }
                _ if self.after_member || b == b',' || b == b'}' => {
                    return Err(decode_err(format!(
                        "unexpected character {:?} after member {}",
                        char::from(b),
                        self.index
                    )));
                }
                _ => {
                    let token = self.scan_member(b)?;
                    let value: Value = serde_json::from_slice(&token).map_err(|e| {
                        decode_err(format!("member {}: {e}", self.index))
                    })?;
                    self.after_member = true;
                    self.after_comma = false;
                    let entry = Entry::indexed(self.index, value);
                    self.index += 1;
                    return Ok(entry);
                }
            }
        }
    }
}

/// Streams entries into a single top-level JSON array or object.
///
/// Object-rooted output is a plain `{"key":value,...}` document for other
/// consumers. [`JsonReader`] only scans array roots and rejects it with
/// [`Error::InvalidRootType`]; use NDJSON or CBOR to round-trip keyed
/// entries.
pub struct JsonWriter {
    st: Structure,
    root: RootType,
    columns: Vec<Column>,
    writer: Option<BufWriter<Box<dyn FinishWrite>>>,
    keys: HashSet<String>,
    count: usize,
}

impl JsonWriter {
    /// # Errors
    /// [`Error::InvalidRootType`] for a schema rooted at anything but
    /// `array` or `object`.
    pub fn new(st: &Structure, writer: Box<dyn FinishWrite>) -> Result<Self> {
        let root = root_or_array(st)?;
        debug!(?root, "json writer ready");
        Ok(Self {
            st: st.clone(),
            root,
            columns: st.columns(),
            writer: Some(BufWriter::new(writer)),
            keys: HashSet::new(),
            count: 0,
        })
    }

    /// Encodes a row. Object rows list the schema's declared columns first,
    /// in declaration order, followed by any undeclared keys.
    fn encode_row(&self, value: &Value) -> Result<Vec<u8>> {
        let Value::Object(map) = value else {
            return Ok(serde_json::to_vec(value)?);
        };
        if self.columns.is_empty() {
            return Ok(serde_json::to_vec(value)?);
        }
        let declared: Vec<&str> = self
            .columns
            .iter()
            .map(|c| c.title.as_str())
            .filter(|t| map.contains_key(*t))
            .collect();
        let rest = map
            .keys()
            .map(String::as_str)
            .filter(|k| !self.columns.iter().any(|c| c.title == *k));
        let mut out = vec![b'{'];
        for (i, key) in declared.into_iter().chain(rest).enumerate() {
            if i > 0 {
                out.push(b',');
            }
            serde_json::to_writer(&mut out, key)?;
            out.push(b':');
            serde_json::to_writer(&mut out, &map[key])?;
        }
        out.push(b'}');
        Ok(out)
    }
}

impl EntryWriter for JsonWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        if self.writer.is_none() {
            return Err(Error::Closed("json writer"));
        }
        let lead: &[u8] = match (self.count, self.root) {
            (0, RootType::Array) => b"[",
            (0, RootType::Object) => b"{",
            _ => b",\n",
        };
        let mut chunk = lead.to_vec();
        if self.root == RootType::Object {
            let key = entry.key.as_deref().ok_or_else(|| {
                Error::UnsupportedValueShape("object-rooted entry without a key".to_string())
            })?;
            if self.keys.contains(key) {
                return Err(Error::DuplicateKey(key.to_string()));
            }
            serde_json::to_writer(&mut chunk, key)?;
            chunk.push(b':');
        }
        chunk.extend(self.encode_row(&entry.value)?);

        let writer = self.writer.as_mut().ok_or(Error::Closed("json writer"))?;
        writer.write_all(&chunk)?;
        if let Some(key) = entry.key.filter(|_| self.root == RootType::Object) {
            self.keys.insert(key);
        }
        self.count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let tail: &[u8] = match (self.count, self.root) {
            (0, RootType::Array) => b"[]",
            (0, RootType::Object) => b"{}",
            (_, RootType::Array) => b"\n]",
            (_, RootType::Object) => b"\n}",
        };
        writer.write_all(tail)?;
        writer.into_inner().map_err(IntoInnerError::into_error)?.finish()?;
        Ok(())
    }
}
