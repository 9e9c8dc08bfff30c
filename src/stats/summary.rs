//! Finalized statistics: the plain-data tree an accumulator produces.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::sketch::Histogram;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Statistics for one node of the data, tagged by kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Stats {
    Numeric(NumericStats),
    String(StringStats),
    Boolean(BooleanStats),
    Null(NullStats),
    Object(CompositeStats),
    Array(CompositeStats),
}

impl Stats {
    /// Number of values this node accepted.
    #[must_use]
    pub const fn count(&self) -> u64 {
        match self {
            Self::Numeric(s) => s.count,
            Self::String(s) => s.count,
            Self::Boolean(s) => s.count,
            Self::Null(s) => s.count,
            Self::Object(s) | Self::Array(s) => s.count,
        }
    }

    /// Children of an object or array node, in first-seen order.
    #[must_use]
    pub fn children(&self) -> &[ChildStats] {
        match self {
            Self::Object(s) | Self::Array(s) => &s.values,
            _ => &[],
        }
    }

    /// Child of an object node by key.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Self> {
        self.children()
            .iter()
            .find(|c| c.key.as_deref() == Some(key))
            .map(|c| &c.stats)
    }

    /// The tree as plain JSON-shaped data.
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    pub count: u64,
    pub min: Number,
    pub max: Number,
    pub mean: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub type_mismatches: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringStats {
    pub count: u64,
    pub min_length: usize,
    pub max_length: usize,
    /// Approximate distinct count.
    pub unique: u64,
    /// Most frequent values, bounded by the configured cap.
    pub frequencies: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub type_mismatches: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanStats {
    pub count: u64,
    pub true_count: u64,
    pub false_count: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub type_mismatches: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullStats {
    pub count: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub type_mismatches: u64,
}

/// Object and array nodes: a count plus one child per key or index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeStats {
    pub count: u64,
    pub values: Vec<ChildStats>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub type_mismatches: u64,
}

/// A child node tagged with its key (object parents) or index (array
/// parents).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(flatten)]
    pub stats: Stats,
}
