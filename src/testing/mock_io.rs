//! Encode and decode entries without touching the real filesystem, or
//! through temporary files that clean up after themselves.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

use crate::entry::{Entry, EntryWriter, read_all};
use crate::error::Result;
use crate::helpers::SharedBuffer;
use crate::io::{new_entry_reader, new_entry_writer};
use crate::structure::Structure;

/// Encodes `entries` with the writer for `st` and returns the bytes.
///
/// # Errors
/// Whatever the writer reports.
pub fn encode_entries(st: &Structure, entries: impl IntoIterator<Item = Entry>) -> Result<Vec<u8>> {
    let sink = SharedBuffer::default();
    let mut writer = new_entry_writer(st, sink.clone())?;
    for entry in entries {
        writer.write_entry(entry)?;
    }
    writer.close()?;
    Ok(sink.to_vec())
}

/// Decodes every entry in `bytes` with the reader for `st`.
///
/// # Errors
/// Whatever the reader reports, other than end of entries.
pub fn decode_entries(st: &Structure, bytes: Vec<u8>) -> Result<Vec<Entry>> {
    let mut reader = new_entry_reader(st, Cursor::new(bytes))?;
    read_all(&mut reader)
}

/// A temporary file that is deleted when dropped.
pub struct TempFilePath {
    #[allow(dead_code)]
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// Create a new temporary file with a specific extension.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be created.
    pub fn with_extension(extension: &str) -> std::io::Result<Self> {
        let temp_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory that is deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// # Errors
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path for `filename` inside this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

/// Writes `entries` for `st` into a temporary file named after the format.
///
/// # Errors
/// File creation or encoding failure.
///
/// # Example
///
/// ```
/// use entryio::DataFormat;
/// use entryio::testing::{mock_entry_file, people_entries, people_structure};
///
/// let st = people_structure(DataFormat::Json);
/// let file = mock_entry_file(&st, people_entries()).unwrap();
/// assert!(file.path().exists());
/// ```
pub fn mock_entry_file(
    st: &Structure,
    entries: impl IntoIterator<Item = Entry>,
) -> Result<TempFilePath> {
    let temp = TempFilePath::with_extension(st.format.as_str())?;
    std::fs::write(temp.path(), encode_entries(st, entries)?)?;
    Ok(temp)
}
