//! Testing utilities for code built on entry readers and writers.
//!
//! - **Fixtures**: sample schemas, structures, and rows
//! - **Mock I/O**: encode/decode entries in memory, or through temporary
//!   files
//! - **Assertions**: compare entry streams and check the end-of-entries
//!   sentinel
//!
//! # Quick Start
//!
//! ```
//! use entryio::DataFormat;
//! use entryio::testing::*;
//!
//! # fn main() -> entryio::Result<()> {
//! let st = people_structure(DataFormat::Ndjson);
//! let entries = people_entries();
//! let bytes = encode_entries(&st, entries.clone())?;
//! assert_entries_equal(decode_entries(&st, bytes)?, entries);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
