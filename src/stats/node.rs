//! Per-node accumulators.
//!
//! A node starts uninitialized and picks its kind from the first value it
//! sees. Later values of a different kind are counted as type mismatches
//! and otherwise ignored. Finishing consumes the node, so a finished tree
//! can never be written again.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use tracing::trace;

use super::StatsConfig;
use super::summary::{
    BooleanStats, ChildStats, CompositeStats, NullStats, NumericStats, Stats, StringStats,
};
use crate::sketch::{Kmv, TDigest, TopK};
use crate::value::ValueType;

pub(crate) enum Node {
    Uninitialized,
    Numeric(NumericAcc),
    String(StringAcc),
    Boolean(BooleanAcc),
    Null(NullAcc),
    Object(ObjectAcc),
    Array(ArrayAcc),
}

fn mismatch(expected: ValueType, value: &Value, mismatches: &mut u64) {
    *mismatches += 1;
    trace!(%expected, found = %ValueType::of(value), "stats type mismatch");
}

impl Node {
    fn for_value(value: &Value, cfg: &StatsConfig) -> Self {
        match value {
            Value::Number(_) => Self::Numeric(NumericAcc::new(cfg)),
            Value::String(_) => Self::String(StringAcc::new(cfg)),
            Value::Bool(_) => Self::Boolean(BooleanAcc::default()),
            Value::Object(_) => Self::Object(ObjectAcc::default()),
            Value::Array(_) => Self::Array(ArrayAcc::default()),
            Value::Null => Self::Null(NullAcc::default()),
        }
    }

    pub(crate) fn write(&mut self, value: &Value, cfg: &StatsConfig) {
        if matches!(self, Self::Uninitialized) {
            *self = Self::for_value(value, cfg);
        }
        match self {
            Self::Uninitialized => {}
            Self::Numeric(acc) => acc.write(value),
            Self::String(acc) => acc.write(value),
            Self::Boolean(acc) => acc.write(value),
            Self::Null(acc) => acc.write(value),
            Self::Object(acc) => acc.write(value, cfg),
            Self::Array(acc) => acc.write(value, cfg),
        }
    }

    /// `None` for a node that never saw a value.
    pub(crate) fn finish(self, cfg: &StatsConfig) -> Option<Stats> {
        Some(match self {
            Self::Uninitialized => return None,
            Self::Numeric(acc) => Stats::Numeric(acc.finish(cfg)),
            Self::String(acc) => Stats::String(acc.finish()),
            Self::Boolean(acc) => Stats::Boolean(acc.finish()),
            Self::Null(acc) => Stats::Null(acc.finish()),
            Self::Object(acc) => Stats::Object(acc.finish(cfg)),
            Self::Array(acc) => Stats::Array(acc.finish(cfg)),
        })
    }
}

/* ===================== numeric ===================== */

pub(crate) struct NumericAcc {
    count: u64,
    sum: f64,
    min: Option<(f64, Number)>,
    max: Option<(f64, Number)>,
    digest: TDigest,
    mismatches: u64,
}

impl NumericAcc {
    fn new(cfg: &StatsConfig) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: None,
            max: None,
            digest: TDigest::new(cfg.digest_compression),
            mismatches: 0,
        }
    }

    fn write(&mut self, value: &Value) {
        let Some((n, f)) = (match value {
            Value::Number(n) => n.as_f64().map(|f| (n, f)),
            _ => None,
        }) else {
            mismatch(ValueType::Number, value, &mut self.mismatches);
            return;
        };
        self.count += 1;
        self.sum += f;
        if self.min.as_ref().is_none_or(|(m, _)| f < *m) {
            self.min = Some((f, n.clone()));
        }
        if self.max.as_ref().is_none_or(|(m, _)| f > *m) {
            self.max = Some((f, n.clone()));
        }
        self.digest.add(f);
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(mut self, cfg: &StatsConfig) -> NumericStats {
        self.digest.compress();
        let mean = if self.count == 0 { 0.0 } else { self.sum / self.count as f64 };
        NumericStats {
            count: self.count,
            min: self.min.map_or_else(|| Number::from(0), |(_, n)| n),
            max: self.max.map_or_else(|| Number::from(0), |(_, n)| n),
            mean,
            median: self.digest.quantile(0.5),
            histogram: self.digest.histogram(cfg.histogram_bins),
            type_mismatches: self.mismatches,
        }
    }
}

/* ===================== string ===================== */

pub(crate) struct StringAcc {
    count: u64,
    min_length: usize,
    max_length: usize,
    distinct: Kmv,
    frequent: TopK,
    mismatches: u64,
}

impl StringAcc {
    fn new(cfg: &StatsConfig) -> Self {
        Self {
            count: 0,
            min_length: usize::MAX,
            max_length: 0,
            distinct: Kmv::new(cfg.cardinality_k),
            frequent: TopK::new(cfg.top_k_cap),
            mismatches: 0,
        }
    }

    fn write(&mut self, value: &Value) {
        let Some(s) = value.as_str() else {
            mismatch(ValueType::String, value, &mut self.mismatches);
            return;
        };
        let len = s.chars().count();
        self.count += 1;
        self.min_length = self.min_length.min(len);
        self.max_length = self.max_length.max(len);
        self.distinct.insert(s);
        self.frequent.insert(s);
    }

    fn finish(self) -> StringStats {
        StringStats {
            count: self.count,
            min_length: if self.count == 0 { 0 } else { self.min_length },
            max_length: self.max_length,
            unique: self.distinct.estimate(),
            frequencies: self.frequent.top().into_iter().collect(),
            type_mismatches: self.mismatches,
        }
    }
}

/* ===================== boolean / null ===================== */

#[derive(Default)]
pub(crate) struct BooleanAcc {
    true_count: u64,
    false_count: u64,
    mismatches: u64,
}

impl BooleanAcc {
    fn write(&mut self, value: &Value) {
        match value {
            Value::Bool(true) => self.true_count += 1,
            Value::Bool(false) => self.false_count += 1,
            other => mismatch(ValueType::Boolean, other, &mut self.mismatches),
        }
    }

    const fn finish(self) -> BooleanStats {
        BooleanStats {
            count: self.true_count + self.false_count,
            true_count: self.true_count,
            false_count: self.false_count,
            type_mismatches: self.mismatches,
        }
    }
}

#[derive(Default)]
pub(crate) struct NullAcc {
    count: u64,
    mismatches: u64,
}

impl NullAcc {
    fn write(&mut self, value: &Value) {
        if value.is_null() {
            self.count += 1;
        } else {
            mismatch(ValueType::Null, value, &mut self.mismatches);
        }
    }

    const fn finish(self) -> NullStats {
        NullStats {
            count: self.count,
            type_mismatches: self.mismatches,
        }
    }
}

/* ===================== composite ===================== */

/// Children keyed by member name, in first-seen order.
#[derive(Default)]
pub(crate) struct ObjectAcc {
    count: u64,
    children: Vec<(String, Node)>,
    positions: HashMap<String, usize>,
    mismatches: u64,
}

impl ObjectAcc {
    fn write(&mut self, value: &Value, cfg: &StatsConfig) {
        let Some(map) = value.as_object() else {
            mismatch(ValueType::Object, value, &mut self.mismatches);
            return;
        };
        self.count += 1;
        self.write_members(map, cfg);
    }

    fn write_members(&mut self, map: &Map<String, Value>, cfg: &StatsConfig) {
        for (key, member) in map {
            let slot = match self.positions.get(key) {
                Some(&slot) => slot,
                None => {
                    self.children.push((key.clone(), Node::Uninitialized));
                    self.positions.insert(key.clone(), self.children.len() - 1);
                    self.children.len() - 1
                }
            };
            self.children[slot].1.write(member, cfg);
        }
    }

    fn finish(self, cfg: &StatsConfig) -> CompositeStats {
        let values = self
            .children
            .into_iter()
            .filter_map(|(key, node)| {
                node.finish(cfg).map(|stats| ChildStats {
                    key: Some(key),
                    index: None,
                    stats,
                })
            })
            .collect();
        CompositeStats {
            count: self.count,
            values,
            type_mismatches: self.mismatches,
        }
    }
}

/// Children by position.
#[derive(Default)]
pub(crate) struct ArrayAcc {
    count: u64,
    children: Vec<Node>,
    mismatches: u64,
}

impl ArrayAcc {
    fn write(&mut self, value: &Value, cfg: &StatsConfig) {
        let Some(items) = value.as_array() else {
            mismatch(ValueType::Array, value, &mut self.mismatches);
            return;
        };
        self.count += 1;
        if self.children.len() < items.len() {
            self.children.resize_with(items.len(), || Node::Uninitialized);
        }
        for (child, item) in self.children.iter_mut().zip(items) {
            child.write(item, cfg);
        }
    }

    fn finish(self, cfg: &StatsConfig) -> CompositeStats {
        let values = self
            .children
            .into_iter()
            .enumerate()
            .filter_map(|(index, node)| {
                node.finish(cfg).map(|stats| ChildStats {
                    key: None,
                    index: Some(index),
                    stats,
                })
            })
            .collect();
        CompositeStats {
            count: self.count,
            values,
            type_mismatches: self.mismatches,
        }
    }
}
