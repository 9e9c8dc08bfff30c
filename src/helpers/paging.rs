use crate::entry::{Entry, EntryReader};
use crate::error::{Error, Result};
use crate::structure::Structure;

/// Skips `offset` entries of the wrapped reader, then yields at most `limit`
/// more before reporting end of entries, even if the wrapped reader has
/// more. A `limit` of `None` yields everything after the offset.
///
/// Entries keep the index the wrapped reader gave them.
pub struct PagedReader<R> {
    inner: R,
    offset: usize,
    limit: Option<usize>,
    skipped: bool,
    yielded: usize,
}

impl<R: EntryReader> PagedReader<R> {
    pub const fn new(inner: R, offset: usize, limit: Option<usize>) -> Self {
        Self {
            inner,
            offset,
            limit,
            skipped: false,
            yielded: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: EntryReader> EntryReader for PagedReader<R> {
    fn structure(&self) -> &Structure {
        self.inner.structure()
    }

    fn read_entry(&mut self) -> Result<Entry> {
        if !self.skipped {
            self.skipped = true;
            for _ in 0..self.offset {
                self.inner.read_entry()?;
            }
        }
        if self.limit.is_some_and(|limit| self.yielded >= limit) {
            return Err(Error::EndOfEntries);
        }
        let entry = self.inner.read_entry()?;
        self.yielded += 1;
        Ok(entry)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
