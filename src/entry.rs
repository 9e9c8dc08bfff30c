//! Entries and the reader/writer capabilities every codec implements.
//!
//! An [`Entry`] is one unit of exchange: a position (index), an optional key
//! (object-rooted datasets only), and a dynamically typed value. Readers are
//! forward-only and finite; they report exhaustion with
//! [`Error::EndOfEntries`](crate::Error::EndOfEntries). Writers may buffer, and only emit closing bytes
//! (array brackets, workbook trailers) on [`EntryWriter::close`].
//!
//! Codec instances carry no internal synchronization. Driving one instance
//! from more than one call sequence at a time is the caller's problem.

use crate::error::Result;
use crate::structure::Structure;
use serde_json::Value;

/// One value read from or written to a dataset body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    /// Position in the stream.
    pub index: usize,
    /// Key, present only for object-rooted datasets.
    pub key: Option<String>,
    pub value: Value,
}

impl Entry {
    /// An entry of an array-rooted dataset.
    #[must_use]
    pub const fn indexed(index: usize, value: Value) -> Self {
        Self {
            index,
            key: None,
            value,
        }
    }

    /// An entry of an object-rooted dataset.
    #[must_use]
    pub fn keyed(index: usize, key: impl Into<String>, value: Value) -> Self {
        Self {
            index,
            key: Some(key.into()),
            value,
        }
    }
}

/// Produces entries from a dataset body.
pub trait EntryReader {
    /// The structure this reader decodes.
    fn structure(&self) -> &Structure;

    /// Reads the next entry.
    ///
    /// # Errors
    /// [`Error::EndOfEntries`](crate::Error::EndOfEntries) once the stream is exhausted; any other error
    /// means the input was malformed or unreadable.
    fn read_entry(&mut self) -> Result<Entry>;

    /// Releases resources held by the reader.
    ///
    /// # Errors
    /// Codec specific.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Consumes entries and encodes them.
pub trait EntryWriter {
    /// The structure this writer encodes.
    fn structure(&self) -> &Structure;

    /// Writes one entry.
    ///
    /// # Errors
    /// Codec specific; see [`Error::DuplicateKey`](crate::Error::DuplicateKey)
    /// and [`Error::UnsupportedValueShape`](crate::Error::UnsupportedValueShape).
    fn write_entry(&mut self, entry: Entry) -> Result<()>;

    /// Emits any closing bytes and flushes.
    ///
    /// # Errors
    /// Codec specific.
    fn close(&mut self) -> Result<()>;
}

impl<T: EntryReader + ?Sized> EntryReader for Box<T> {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }
    fn read_entry(&mut self) -> Result<Entry> {
        (**self).read_entry()
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: EntryReader + ?Sized> EntryReader for &mut T {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }
    fn read_entry(&mut self) -> Result<Entry> {
        (**self).read_entry()
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: EntryWriter + ?Sized> EntryWriter for Box<T> {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }
    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        (**self).write_entry(entry)
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: EntryWriter + ?Sized> EntryWriter for &mut T {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }
    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        (**self).write_entry(entry)
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Calls `f` with the position and value of every entry until the reader is
/// exhausted.
///
/// Stops cleanly on [`Error::EndOfEntries`](crate::Error::EndOfEntries). Any other error, from the
/// reader or from `f`, is returned immediately, tagged with the entry
/// position.
///
/// # Returns
/// The number of entries visited.
///
/// # Errors
/// The first read or callback error.
pub fn each_entry<R, F>(reader: &mut R, mut f: F) -> Result<usize>
where
    R: EntryReader + ?Sized,
    F: FnMut(usize, Entry) -> Result<()>,
{
    let mut i = 0usize;
    loop {
        let entry = match reader.read_entry() {
            Ok(entry) => entry,
            Err(e) if e.is_end_of_entries() => return Ok(i),
            Err(e) => return Err(e.at_entry(i)),
        };
        f(i, entry).map_err(|e| e.at_entry(i))?;
        i += 1;
    }
}

/// Drains `reader` into `writer`.
///
/// The writer is not closed; callers finish it themselves so they can keep
/// writing or inspect it first.
///
/// # Returns
/// The number of entries copied.
///
/// # Errors
/// The first read or write error.
pub fn copy<R, W>(reader: &mut R, writer: &mut W) -> Result<usize>
where
    R: EntryReader + ?Sized,
    W: EntryWriter + ?Sized,
{
    each_entry(reader, |_, entry| writer.write_entry(entry))
}

/// Iterator view over a reader: `EndOfEntries` ends iteration, every other
/// error is yielded once and then iteration stops.
pub struct Entries<'a, R: ?Sized> {
    reader: &'a mut R,
    done: bool,
}

/// Borrows `reader` as an iterator of entries.
pub fn entries<R: EntryReader + ?Sized>(reader: &mut R) -> Entries<'_, R> {
    Entries {
        reader,
        done: false,
    }
}

impl<R: EntryReader + ?Sized> Iterator for Entries<'_, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_entry() {
            Ok(entry) => Some(Ok(entry)),
            Err(e) if e.is_end_of_entries() => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads every remaining entry into memory.
///
/// # Errors
/// The first read error.
pub fn read_all<R: EntryReader + ?Sized>(reader: &mut R) -> Result<Vec<Entry>> {
    let mut out = Vec::new();
    each_entry(reader, |_, entry| {
        out.push(entry);
        Ok(())
    })?;
    Ok(out)
}
