use std::io::{self, Read};

/// Byte source that counts the bytes read through it.
///
/// Closing is dropping: [`TrackedReader::into_inner`] hands the wrapped
/// source back when the caller still needs it.
#[derive(Debug)]
pub struct TrackedReader<R> {
    inner: R,
    bytes_read: u64,
}

impl<R: Read> TrackedReader<R> {
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    /// Cumulative bytes consumed so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub const fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}
