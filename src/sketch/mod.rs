//! Bounded-memory summaries used by the statistics accumulator.
//!
//! - [`TDigest`]: quantiles, CDF, and equal-width histograms
//! - [`Kmv`]: approximate distinct count
//! - [`TopK`]: bounded frequency counts

pub mod distinct;
pub mod frequency;
pub mod quantiles;

pub use distinct::Kmv;
pub use frequency::TopK;
pub use quantiles::{Histogram, TDigest};
