use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::io::{FormatReader, FormatWriter, new_entry_reader, new_entry_writer};
use crate::structure::Structure;

/// Growable in-memory byte sink with shared ownership.
///
/// Clones write into the same bytes, so one handle can be given to a writer
/// while another reads the result back.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    /// Copy of the bytes written so far.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A writer and a reader of the same structure bound to one in-memory sink.
///
/// Entries written are encoded into the sink; the first read closes the
/// writer (emitting any closing bytes) and decodes the sink from the start.
/// Used to re-encode a drained entry stream into another format's bytes.
///
/// ```
/// use entryio::helpers::EntryBuffer;
/// use entryio::{DataFormat, Entry, EntryReader, EntryWriter, Structure};
/// use serde_json::json;
///
/// # fn main() -> entryio::Result<()> {
/// let st = Structure::new(DataFormat::Json).with_schema(json!({"type": "array"}));
/// let mut buf = EntryBuffer::new(&st)?;
/// buf.write_entry(Entry::indexed(0, json!("a")))?;
/// EntryWriter::close(&mut buf)?;
/// assert_eq!(buf.bytes(), b"[\"a\"\n]");
/// assert_eq!(buf.read_entry()?.value, json!("a"));
/// # Ok(())
/// # }
/// ```
pub struct EntryBuffer {
    st: Structure,
    sink: SharedBuffer,
    writer: Option<FormatWriter>,
    reader: Option<FormatReader>,
    reader_closed: bool,
}

impl EntryBuffer {
    /// # Errors
    /// Anything [`new_entry_writer`] rejects for `st`.
    pub fn new(st: &Structure) -> Result<Self> {
        let sink = SharedBuffer::default();
        let writer = new_entry_writer(st, sink.clone())?;
        Ok(Self {
            st: st.clone(),
            sink,
            writer: Some(writer),
            reader: None,
            reader_closed: false,
        })
    }

    /// Encoded bytes written so far. Complete only after the writer side has
    /// been closed.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.sink.to_vec()
    }

    fn close_writer(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }
}

impl EntryWriter for EntryBuffer {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        self.writer
            .as_mut()
            .ok_or(Error::Closed("entry buffer writer"))?
            .write_entry(entry)
    }

    fn close(&mut self) -> Result<()> {
        self.close_writer()
    }
}

impl EntryReader for EntryBuffer {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        if self.reader_closed {
            return Err(Error::Closed("entry buffer reader"));
        }
        if self.reader.is_none() {
            self.close_writer()?;
            let reader = new_entry_reader(&self.st, Cursor::new(self.sink.to_vec()))?;
            self.reader = Some(reader);
        }
        match self.reader.as_mut() {
            Some(reader) => reader.read_entry(),
            None => Err(Error::EndOfEntries),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.close_writer()?;
        self.reader_closed = true;
        if let Some(mut reader) = self.reader.take() {
            reader.close()?;
        }
        Ok(())
    }
}
