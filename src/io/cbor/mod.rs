//! CBOR entry reader and writer.
//!
//! The body is a single top-level array or map. The reader classifies the
//! header byte once at construction, then walks members one at a time: each
//! member's full byte span is framed by [`token`] and only then materialized
//! by `ciborium`.
//! Top-level indefinite-length containers are read up to their break byte;
//! nested indefinite items and tags are decode errors.
//!
//! The writer buffers every entry and emits one canonically encoded item on
//! `close`, so output is byte-for-byte deterministic.

mod token;
mod value;

pub use value::{decode_value, encode_canonical};

use self::value::materialize;

use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::io::{BufReader, Read, Write};
use tracing::debug;

use self::token::{Argument, decode_err, read_argument, read_byte, read_token};
use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::io::compression::FinishWrite;
use crate::structure::{RootType, Structure};

const BREAK: u8 = 0xff;

/// Streams members of a top-level CBOR array or map as entries.
pub struct CborReader {
    st: Structure,
    root: RootType,
    reader: BufReader<Box<dyn Read>>,
    /// Members left to read; `None` for an indefinite-length container
    /// that has not hit its break byte yet.
    remaining: Option<u64>,
    token: Vec<u8>,
    index: usize,
}

impl CborReader {
    /// Reads and classifies the header byte.
    ///
    /// # Errors
    /// [`Error::SchemaRequired`] without a schema, [`Error::Decode`] when the
    /// body is empty, is not an array or map, or disagrees with the schema's
    /// root type.
    pub fn new(st: &Structure, reader: Box<dyn Read>) -> Result<Self> {
        let root = st.root_type()?;
        let mut reader = BufReader::new(reader);
        let header = read_byte(&mut reader)?.ok_or_else(|| decode_err("empty input"))?;
        let mut scratch = Vec::new();
        let (found, remaining) = match header {
            0x80..=0x9b | 0x9f => (RootType::Array, read_argument(&mut reader, header, &mut scratch)?),
            0xa0..=0xbb | 0xbf => (RootType::Object, read_argument(&mut reader, header, &mut scratch)?),
            other => {
                return Err(decode_err(format!(
                    "top-level item must be an array or map, found byte {other:#04x}"
                )));
            }
        };
        if found != root {
            return Err(decode_err(format!(
                "schema declares a {} root, body is a {}",
                root_name(root),
                root_name(found)
            )));
        }
        let remaining = match remaining {
            Argument::Definite(n) => Some(n),
            Argument::Indefinite => None,
        };
        debug!(?root, ?remaining, "cbor reader ready");
        Ok(Self {
            st: st.clone(),
            root,
            reader,
            remaining,
            token: Vec::new(),
            index: 0,
        })
    }

    /// Frames and decodes the item whose initial byte is `initial`.
    fn item(&mut self, initial: u8) -> Result<Value> {
        self.token.clear();
        read_token(&mut self.reader, initial, &mut self.token)?;
        materialize(&self.token)
    }

    fn next_initial(&mut self, what: &str) -> Result<u8> {
        read_byte(&mut self.reader)?.ok_or_else(|| {
            decode_err(format!(
                "unexpected end of input before {what} of member {}",
                self.index
            ))
        })
    }
}

const fn root_name(root: RootType) -> &'static str {
    match root {
        RootType::Array => "array",
        RootType::Object => "map",
    }
}

impl EntryReader for CborReader {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        if self.remaining == Some(0) {
            return Err(Error::EndOfEntries);
        }
        let mut initial = self.next_initial("the start")?;
        if self.remaining.is_none() && initial == BREAK {
            self.remaining = Some(0);
            return Err(Error::EndOfEntries);
        }
        let entry = match self.root {
            RootType::Array => Entry::indexed(self.index, self.item(initial)?),
            RootType::Object => {
                if !(0x60..=0x7f).contains(&initial) {
                    return Err(decode_err(format!(
                        "map keys must be text strings, found byte {initial:#04x} at member {}",
                        self.index
                    )));
                }
                let Value::String(key) = self.item(initial)? else {
                    return Err(decode_err("map key did not decode to text"));
                };
                initial = self.next_initial("the value")?;
                Entry::keyed(self.index, key, self.item(initial)?)
            }
        };
        if let Some(n) = self.remaining.as_mut() {
            *n -= 1;
        }
        self.index += 1;
        Ok(entry)
    }
}

/// Buffers entries and writes one canonical CBOR item on close.
pub struct CborWriter {
    st: Structure,
    root: RootType,
    writer: Option<Box<dyn FinishWrite>>,
    rows: Vec<Value>,
    members: HashMap<String, Value>,
}

impl CborWriter {
    /// # Errors
    /// [`Error::SchemaRequired`] / [`Error::InvalidRootType`].
    pub fn new(st: &Structure, writer: Box<dyn FinishWrite>) -> Result<Self> {
        let root = st.root_type()?;
        Ok(Self {
            st: st.clone(),
            root,
            writer: Some(writer),
            rows: Vec::new(),
            members: HashMap::new(),
        })
    }
}

impl EntryWriter for CborWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        if self.writer.is_none() {
            return Err(Error::Closed("cbor writer"));
        }
        match self.root {
            RootType::Array => self.rows.push(entry.value),
            RootType::Object => {
                let key = entry.key.ok_or_else(|| {
                    Error::UnsupportedValueShape("object-rooted entry without a key".to_string())
                })?;
                match self.members.entry(key) {
                    MapEntry::Occupied(o) => return Err(Error::DuplicateKey(o.key().clone())),
                    MapEntry::Vacant(v) => {
                        v.insert(entry.value);
                    }
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let body = match self.root {
            RootType::Array => Value::Array(std::mem::take(&mut self.rows)),
            RootType::Object => Value::Object(std::mem::take(&mut self.members).into_iter().collect()),
        };
        let bytes = encode_canonical(&body)?;
        debug!(bytes = bytes.len(), "cbor writer encoded body");
        writer.write_all(&bytes)?;
        writer.finish()?;
        Ok(())
    }
}
