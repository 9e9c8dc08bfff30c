//! Approximate quantiles and histograms using the t-digest algorithm.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/* ===================== TDigest ===================== */

/// A centroid in the t-digest: a weighted point representing a cluster of values.
#[derive(Clone, Debug)]
struct Centroid {
    mean: f64,
    weight: f64,
}

/// T-Digest data structure for approximate quantile estimation.
///
/// Keeps a bounded set of weighted centroids. Estimates are more accurate at
/// the extreme quantiles (0.0 and 1.0) than at the median. Exact `min` and
/// `max` are tracked alongside.
///
/// Based on "Computing Extremely Accurate Quantiles Using t-Digests" by Ted Dunning.
#[derive(Clone, Debug)]
pub struct TDigest {
    /// Accuracy vs. memory. Typical range: 20-1000.
    compression: f64,
    centroids: Vec<Centroid>,
    /// Centroids are sorted by mean (no raw points appended since the last
    /// compression).
    sorted: bool,
    total_weight: f64,
    min: f64,
    max: f64,
}

impl Default for TDigest {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl TDigest {
    /// Create a new t-digest with the specified compression parameter.
    #[must_use]
    pub const fn new(compression: f64) -> Self {
        Self {
            compression,
            centroids: Vec::new(),
            sorted: true,
            total_weight: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add a single value with weight 1. NaN and infinities are ignored.
    #[allow(clippy::cast_precision_loss)]
    pub fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.centroids.push(Centroid {
            mean: value,
            weight: 1.0,
        });
        self.sorted = false;
        self.total_weight += 1.0;

        if self.centroids.len() as f64 > self.compression * 2.0 {
            self.compress();
        }
    }

    /// Sorts centroids and merges neighbours that fit under the k-size limit.
    pub fn compress(&mut self) {
        if self.sorted || self.centroids.is_empty() {
            return;
        }
        self.centroids
            .sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Equal));

        let mut compressed = Vec::new();
        let mut cumulative_weight = 0.0;
        let mut current = self.centroids[0].clone();

        for centroid in self.centroids.iter().skip(1) {
            let proposed_weight = current.weight + centroid.weight;
            let q0 = cumulative_weight / self.total_weight;
            let q1 = (cumulative_weight + proposed_weight) / self.total_weight;
            let k_limit = self.k_size(q0).min(self.k_size(q1));

            if proposed_weight <= k_limit {
                current.mean = current
                    .mean
                    .mul_add(current.weight, centroid.mean * centroid.weight)
                    / proposed_weight;
                current.weight = proposed_weight;
            } else {
                cumulative_weight += current.weight;
                compressed.push(current);
                current = centroid.clone();
            }
        }
        compressed.push(current);

        self.centroids = compressed;
        self.sorted = true;
    }

    /// k(q, δ) = δ·q·(1-q)/2, at least 1: small clusters at the tails.
    fn k_size(&self, q: f64) -> f64 {
        let q = q.clamp(0.0, 1.0);
        (self.compression * q * (1.0 - q) / 2.0).max(1.0)
    }

    /// Centroids in mean order, sorting a copy when points are pending.
    fn ordered(&self) -> std::borrow::Cow<'_, [Centroid]> {
        if self.sorted {
            std::borrow::Cow::Borrowed(&self.centroids)
        } else {
            let mut c = self.centroids.clone();
            c.sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Equal));
            std::borrow::Cow::Owned(c)
        }
    }

    /// Estimate the value at quantile `q` (0.0 = minimum, 1.0 = maximum).
    ///
    /// Returns `None` when the digest is empty.
    ///
    /// # Examples
    /// ```
    /// use entryio::sketch::TDigest;
    /// let mut digest = TDigest::new(100.0);
    /// for i in 1..=100 {
    ///     digest.add(i as f64);
    /// }
    /// let median = digest.quantile(0.5).unwrap_or_default();
    /// assert!((median - 50.0).abs() < 5.0);
    /// ```
    #[must_use]
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let centroids = self.ordered();
        if centroids.is_empty() {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        if q <= f64::EPSILON || centroids.len() == 1 {
            return Some(self.min);
        }
        if (q - 1.0).abs() <= f64::EPSILON {
            return Some(self.max);
        }

        let target = q * self.total_weight;
        let mut cumulative = 0.0;
        for (i, c) in centroids.iter().enumerate() {
            let next_cumulative = cumulative + c.weight;
            if next_cumulative >= target {
                let fraction = (target - cumulative) / c.weight;
                let left = if i == 0 { self.min } else { centroids[i - 1].mean };
                let right = centroids.get(i + 1).map_or(self.max, |n| n.mean);
                return Some(fraction.mul_add(right - left, left));
            }
            cumulative = next_cumulative;
        }
        Some(self.max)
    }

    /// Estimated fraction of values less than or equal to `value`.
    #[must_use]
    pub fn cdf(&self, value: f64) -> f64 {
        let centroids = self.ordered();
        if centroids.is_empty() || value < self.min {
            return 0.0;
        }
        if value >= self.max {
            return 1.0;
        }

        let mut cumulative = 0.0;
        let mut prev_mean = self.min;
        for c in centroids.iter() {
            if value < c.mean {
                let fraction = (value - prev_mean) / (c.mean - prev_mean).max(f64::EPSILON);
                return fraction.mul_add(c.weight, cumulative) / self.total_weight;
            }
            cumulative += c.weight;
            prev_mean = c.mean;
        }
        cumulative / self.total_weight
    }

    /// Equal-width histogram over `[min, max]` with `bins` buckets, frequencies
    /// estimated from the CDF.
    ///
    /// A digest whose values are all equal yields a single bucket.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn histogram(&self, bins: usize) -> Option<Histogram> {
        if self.is_empty() || bins == 0 {
            return None;
        }
        if self.max <= self.min {
            return Some(Histogram {
                bins: vec![self.min, self.max],
                frequencies: vec![self.total_weight as u64],
            });
        }
        let width = (self.max - self.min) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { self.max } else { (i as f64).mul_add(width, self.min) })
            .collect();
        let mut frequencies = Vec::with_capacity(bins);
        let mut below = 0.0;
        for edge in &edges[1..] {
            let at = self.cdf(*edge);
            frequencies.push(((at - below) * self.total_weight).round().max(0.0) as u64);
            below = at;
        }
        Some(Histogram {
            bins: edges,
            frequencies,
        })
    }

    /// Total count of values added.
    #[must_use]
    pub const fn count(&self) -> f64 {
        self.total_weight
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_weight == 0.0
    }
}

/// Bucket edges (`frequencies.len() + 1` of them) and per-bucket counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<f64>,
    pub frequencies: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_unsorted_input() {
        let mut d = TDigest::default();
        for v in [1.0, 5.0, 3.0] {
            d.add(v);
        }
        assert_eq!(d.quantile(0.5), Some(3.0));
        assert_eq!(d.quantile(0.0), Some(1.0));
        assert_eq!(d.quantile(1.0), Some(5.0));
    }

    #[test]
    fn histogram_accounts_for_every_value() {
        let mut d = TDigest::default();
        for i in 0..1000 {
            d.add(f64::from(i));
        }
        d.compress();
        let h = d.histogram(10).expect("non-empty digest");
        assert_eq!(h.bins.len(), 11);
        assert_eq!(h.frequencies.len(), 10);
        let total: u64 = h.frequencies.iter().sum();
        assert!((990..=1010).contains(&total), "total {total}");
        for f in &h.frequencies {
            assert!((70..=130).contains(f), "bucket {f}");
        }
    }

    #[test]
    fn constant_values_single_bucket() {
        let mut d = TDigest::default();
        d.add(7.0);
        d.add(7.0);
        let h = d.histogram(10).expect("non-empty digest");
        assert_eq!(h.bins, vec![7.0, 7.0]);
        assert_eq!(h.frequencies, vec![2]);
        assert!(TDigest::default().histogram(10).is_none());
    }
}
