//! Composable stream utilities: byte counting, in-memory re-encoding,
//! paging, and readers/writers over native values.

mod buffer;
mod identity;
mod paging;
mod tracked;

pub use buffer::{EntryBuffer, SharedBuffer};
pub use identity::{CollectingWriter, IdentityReader, IdentityWriter};
pub use paging::PagedReader;
pub use tracked::TrackedReader;
