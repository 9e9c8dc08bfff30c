//! Bounded top-K frequency counting (space-saving).

use std::collections::HashMap;

/// Counts item frequencies in at most `cap` counters.
///
/// While fewer than `cap` distinct items have been seen the counts are
/// exact. After that, a new item evicts the smallest counter and inherits
/// its count plus one, so heavy hitters are never lost and every reported
/// count overestimates by at most the evicted count.
#[derive(Clone, Debug)]
pub struct TopK {
    cap: usize,
    counters: HashMap<String, u64>,
}

impl Default for TopK {
    fn default() -> Self {
        Self::new(200)
    }
}

impl TopK {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            counters: HashMap::with_capacity(cap.min(1024)),
        }
    }

    pub fn insert(&mut self, item: &str) {
        if let Some(count) = self.counters.get_mut(item) {
            *count += 1;
            return;
        }
        if self.counters.len() < self.cap {
            self.counters.insert(item.to_string(), 1);
            return;
        }
        // evict the smallest counter; ties go to the greatest key so output is stable
        let victim = self
            .counters
            .iter()
            .min_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
            .map(|(k, c)| (k.clone(), *c));
        if let Some((key, floor)) = victim {
            self.counters.remove(&key);
            self.counters.insert(item.to_string(), floor + 1);
        }
    }

    /// Counters, most frequent first, ties by key.
    #[must_use]
    pub fn top(&self) -> Vec<(String, u64)> {
        let mut v: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|(k, c)| (k.clone(), *c))
            .collect();
        v.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
        v
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
