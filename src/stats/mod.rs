//! Streaming descriptive statistics over an entry stream.
//!
//! [`Accumulator`] is an [`EntryWriter`]: every entry's value is fed into a
//! single root node. Nodes choose their kind from the first value they see
//! and, for objects and arrays, grow one child per member key or position,
//! so the accumulator tree mirrors the shape of the data. Memory per node is
//! bounded: numbers go through a [`TDigest`](crate::sketch::TDigest),
//! strings through [`Kmv`](crate::sketch::Kmv) and
//! [`TopK`](crate::sketch::TopK) sketches.
//!
//! Closing finalizes every node (mean division, median, histogram, distinct
//! estimate, top frequencies) and is irreversible.
//!
//! ```
//! use entryio::stats::Accumulator;
//! use entryio::{DataFormat, Entry, EntryWriter, Structure};
//! use serde_json::json;
//!
//! # fn main() -> entryio::Result<()> {
//! let st = Structure::new(DataFormat::Json).with_schema(json!({"type": "array"}));
//! let mut acc = Accumulator::new(&st);
//! for (i, v) in [1, 5, 3].into_iter().enumerate() {
//!     acc.write_entry(Entry::indexed(i, json!(v)))?;
//! }
//! acc.close()?;
//! let stats = acc.stats().expect("closed with entries").to_value()?;
//! assert_eq!(stats["count"], 3);
//! assert_eq!(stats["mean"], 3.0);
//! # Ok(())
//! # }
//! ```

mod node;
mod summary;

pub use summary::{
    BooleanStats, ChildStats, CompositeStats, NullStats, NumericStats, Stats, StringStats,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::node::Node;
use crate::entry::{Entry, EntryReader, EntryWriter, copy};
use crate::error::{Error, Result};
use crate::structure::Structure;

/// Sketch sizes used by an [`Accumulator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsConfig {
    /// Most distinct string values tracked for `frequencies`.
    pub top_k_cap: usize,
    /// Buckets in numeric histograms.
    pub histogram_bins: usize,
    /// t-digest compression (accuracy vs. memory).
    pub digest_compression: f64,
    /// Hash ranks kept for distinct-count estimation.
    pub cardinality_k: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_k_cap: 200,
            histogram_bins: 10,
            digest_compression: 100.0,
            cardinality_k: 1024,
        }
    }
}

enum State {
    Accumulating(Node),
    Closed(Option<Stats>),
}

/// Builds a statistics tree from the entries written to it.
pub struct Accumulator {
    st: Structure,
    config: StatsConfig,
    state: State,
    entries: u64,
}

impl Accumulator {
    #[must_use]
    pub fn new(st: &Structure) -> Self {
        Self::with_config(st, StatsConfig::default())
    }

    #[must_use]
    pub fn with_config(st: &Structure, config: StatsConfig) -> Self {
        Self {
            st: st.clone(),
            config,
            state: State::Accumulating(Node::Uninitialized),
            entries: 0,
        }
    }

    /// Finalized statistics. `None` until closed, or when no entries were
    /// written.
    #[must_use]
    pub const fn stats(&self) -> Option<&Stats> {
        match &self.state {
            State::Closed(stats) => stats.as_ref(),
            State::Accumulating(_) => None,
        }
    }

    /// Consumes the accumulator, closing it first if needed.
    #[must_use]
    pub fn into_stats(mut self) -> Option<Stats> {
        self.finalize();
        match self.state {
            State::Closed(stats) => stats,
            State::Accumulating(_) => None,
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed(_))
    }

    fn finalize(&mut self) {
        if self.is_closed() {
            return;
        }
        if let State::Accumulating(root) = std::mem::replace(&mut self.state, State::Closed(None)) {
            let stats = root.finish(&self.config);
            debug!(entries = self.entries, "stats accumulator closed");
            self.state = State::Closed(stats);
        }
    }
}

impl EntryWriter for Accumulator {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        let State::Accumulating(root) = &mut self.state else {
            return Err(Error::Closed("stats accumulator"));
        };
        root.write(&entry.value, &self.config);
        self.entries += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.finalize();
        Ok(())
    }
}

/// Drains `reader` through a fresh accumulator and returns the finished
/// statistics.
///
/// # Errors
/// The first read error.
pub fn accumulate<R: EntryReader + ?Sized>(
    reader: &mut R,
    config: StatsConfig,
) -> Result<Option<Stats>> {
    let mut acc = Accumulator::with_config(reader.structure(), config);
    copy(reader, &mut acc)?;
    Ok(acc.into_stats())
}
