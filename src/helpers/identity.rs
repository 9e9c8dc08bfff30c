use serde_json::{Map, Value, json};
use std::iter::Enumerate;

use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::structure::{DataFormat, RootType, Structure};
use crate::value::ValueType;

enum Cursor {
    Array(Enumerate<std::vec::IntoIter<Value>>),
    Object(Enumerate<serde_json::map::IntoIter>),
}

/// Reads entries straight out of an in-memory array or object.
///
/// Arrays yield indexed entries in order; objects yield keyed entries in
/// the map's iteration order. Nothing is decoded and nothing runs in the
/// background: closing simply drops whatever has not been read.
pub struct IdentityReader {
    st: Structure,
    cursor: Option<Cursor>,
}

impl IdentityReader {
    /// Reader over `data`, with a structure whose schema root matches it.
    ///
    /// # Errors
    /// [`Error::UnsupportedValueShape`] unless `data` is an array or object.
    pub fn from_value(data: Value) -> Result<Self> {
        let root = match &data {
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            other => {
                return Err(Error::UnsupportedValueShape(format!(
                    "identity reader needs an array or object, found {}",
                    ValueType::of(other)
                )));
            }
        };
        let st = Structure::new(DataFormat::Unknown).with_schema(json!({ "type": root }));
        Self::new(&st, data)
    }

    /// Reader over `data` described by `st`.
    ///
    /// # Errors
    /// [`Error::SchemaRequired`] / [`Error::InvalidRootType`] from `st`, or
    /// [`Error::UnsupportedValueShape`] when `data` does not match the root.
    pub fn new(st: &Structure, data: Value) -> Result<Self> {
        let cursor = match (st.root_type()?, data) {
            (RootType::Array, Value::Array(items)) => Cursor::Array(items.into_iter().enumerate()),
            (RootType::Object, Value::Object(map)) => Cursor::Object(map.into_iter().enumerate()),
            (root, other) => {
                return Err(Error::UnsupportedValueShape(format!(
                    "{root:?}-rooted structure over {} data",
                    ValueType::of(&other)
                )));
            }
        };
        Ok(Self {
            st: st.clone(),
            cursor: Some(cursor),
        })
    }
}

impl EntryReader for IdentityReader {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        let next = match self.cursor.as_mut() {
            Some(Cursor::Array(items)) => items.next().map(|(i, v)| Entry::indexed(i, v)),
            Some(Cursor::Object(members)) => members.next().map(|(i, (k, v))| Entry::keyed(i, k, v)),
            None => None,
        };
        next.ok_or(Error::EndOfEntries)
    }

    fn close(&mut self) -> Result<()> {
        self.cursor = None;
        Ok(())
    }
}

/// Entry sink that keeps nothing but a count.
pub struct IdentityWriter {
    st: Structure,
    written: usize,
}

impl IdentityWriter {
    #[must_use]
    pub fn new(st: &Structure) -> Self {
        Self {
            st: st.clone(),
            written: 0,
        }
    }

    /// Entries accepted so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }
}

impl EntryWriter for IdentityWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, _entry: Entry) -> Result<()> {
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects entries back into an in-memory array or object; the inverse of
/// [`IdentityReader`].
pub struct CollectingWriter {
    st: Structure,
    root: RootType,
    rows: Vec<Value>,
    members: Map<String, Value>,
}

impl CollectingWriter {
    /// # Errors
    /// [`Error::SchemaRequired`] / [`Error::InvalidRootType`].
    pub fn new(st: &Structure) -> Result<Self> {
        Ok(Self {
            st: st.clone(),
            root: st.root_type()?,
            rows: Vec::new(),
            members: Map::new(),
        })
    }

    /// The collected array (array roots) or object (object roots).
    #[must_use]
    pub fn into_value(self) -> Value {
        match self.root {
            RootType::Array => Value::Array(self.rows),
            RootType::Object => Value::Object(self.members),
        }
    }
}

impl EntryWriter for CollectingWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        match self.root {
            RootType::Array => self.rows.push(entry.value),
            RootType::Object => {
                let key = entry.key.ok_or_else(|| {
                    Error::UnsupportedValueShape("object-rooted entry without a key".to_string())
                })?;
                if self.members.contains_key(&key) {
                    return Err(Error::DuplicateKey(key));
                }
                self.members.insert(key, entry.value);
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
