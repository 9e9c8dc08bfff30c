//! Approximate distinct counting with the KMV (K-Minimum Values) estimator.

use ordered_float::NotNan;
use std::collections::{BinaryHeap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Keeps the `k` smallest hash ranks in a max-heap; the estimate is
/// `(k-1)/r_k` where `r_k` is the k-th smallest retained rank. Below `k`
/// distinct values the count is exact.
#[derive(Clone, Debug)]
pub struct Kmv {
    k: usize,
    /// max-heap of the kept k smallest
    heap: BinaryHeap<NotNan<f64>>,
    /// membership test to prevent duplicates
    set: HashSet<NotNan<f64>>,
}

impl Default for Kmv {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[inline]
#[allow(clippy::cast_precision_loss)]
fn rank_from_value<T: Hash + ?Sized>(v: &T) -> Option<NotNan<f64>> {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    let u = h.finish();
    // uniform in [0,1)
    NotNan::new((u as f64) / ((u64::MAX as f64) + 1.0)).ok()
}

impl Kmv {
    /// `k` is raised to at least 4.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(4),
            heap: BinaryHeap::new(),
            set: HashSet::new(),
        }
    }

    pub fn insert<T: Hash + ?Sized>(&mut self, value: &T) {
        let Some(r) = rank_from_value(value) else {
            return;
        };
        if !self.set.insert(r) {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(r);
            return;
        }
        match self.heap.peek() {
            Some(&rk) if r < rk => {
                self.heap.pop();
                self.set.remove(&rk);
                self.heap.push(r);
            }
            _ => {
                self.set.remove(&r);
            }
        }
    }

    /// Estimated number of distinct values inserted.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn estimate(&self) -> u64 {
        let m = self.set.len();
        if m < self.k {
            return m as u64;
        }
        match self.heap.peek() {
            Some(rk) if rk.into_inner() > 0.0 => {
                (((self.k as f64) - 1.0) / rk.into_inner()).round() as u64
            }
            _ => m as u64,
        }
    }
}
