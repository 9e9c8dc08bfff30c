//! Dynamically typed entry values and the value-type lattice.
//!
//! Entry values are plain [`serde_json::Value`]s. [`ValueType`] is the
//! discriminated lattice used by string-oriented formats (CSV, XLSX) to infer
//! and coerce cell types. When inferring from raw bytes the precedence is
//! Integer > Number > Boolean > JSON (Object/Array) > String.

use serde_json::Number;
use std::cmp::Ordering;
use std::fmt;

pub use serde_json::{Map, Value};

/// Type of a value as declared by a schema or inferred from content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    #[default]
    Unknown,
    Null,
    Integer,
    Number,
    Boolean,
    String,
    Object,
    Array,
}

impl ValueType {
    /// Parses a JSON-Schema type name. Unrecognized names map to `Unknown`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "null" => Self::Null,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            "object" => Self::Object,
            "array" => Self::Array,
            _ => Self::Unknown,
        }
    }

    /// JSON-Schema type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Null => "null",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Type of an already materialized value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infers the type of raw cell content.
///
/// Blank input is `Unknown`; anything that is not an integer, number,
/// boolean keyword, or JSON object/array is a `String`.
#[must_use]
pub fn parse_value_type(raw: &[u8]) -> ValueType {
    let Ok(text) = std::str::from_utf8(raw) else {
        return ValueType::String;
    };
    let text = text.trim();
    if text.is_empty() {
        return ValueType::Unknown;
    }
    if parse_integer(text).is_some() {
        return ValueType::Integer;
    }
    if parse_number(text).is_some() {
        return ValueType::Number;
    }
    if parse_boolean(text).is_some() {
        return ValueType::Boolean;
    }
    if text.starts_with('{') || text.starts_with('[') {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(_)) => return ValueType::Object,
            Ok(Value::Array(_)) => return ValueType::Array,
            _ => {}
        }
    }
    ValueType::String
}

/// Parses a signed or unsigned 64-bit integer.
#[must_use]
pub fn parse_integer(text: &str) -> Option<Number> {
    let text = text.trim();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let text = text.strip_prefix('+').unwrap_or(text);
    if let Ok(i) = text.parse::<i64>() {
        return Some(i.into());
    }
    text.parse::<u64>().ok().map(Number::from)
}

/// Parses a finite floating point number. Spellings like `inf` or `NaN`
/// are rejected.
#[must_use]
pub fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if text
        .bytes()
        .any(|b| !(b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')))
    {
        return None;
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Parses the boolean keywords `true` / `false`, case-insensitively.
#[must_use]
pub fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Coerces text to a value of type `ty`.
///
/// `String` and `Unknown` always succeed; `Null` always yields null.
///
/// # Errors
/// Returns a message describing why `text` is not a valid `ty`.
pub fn coerce_str(text: &str, ty: ValueType) -> Result<Value, String> {
    match ty {
        ValueType::Null => Ok(Value::Null),
        ValueType::String | ValueType::Unknown => Ok(Value::String(text.to_string())),
        ValueType::Integer => parse_integer(text)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid integer {text:?}")),
        ValueType::Number => parse_number(text)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid number {text:?}")),
        ValueType::Boolean => parse_boolean(text)
            .map(Value::Bool)
            .ok_or_else(|| format!("invalid boolean {text:?}")),
        ValueType::Object | ValueType::Array => {
            let v: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
            if ValueType::of(&v) == ty {
                Ok(v)
            } else {
                Err(format!("expected {ty}, found {}", ValueType::of(&v)))
            }
        }
    }
}

/// Like [`coerce_str`], but falls back to the raw text when coercion fails.
#[must_use]
pub fn coerce_str_lossy(text: &str, ty: ValueType) -> Value {
    coerce_str(text, ty).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Compares two raw values of the same type.
///
/// Defined for `Integer`, `Number` (total order), and `String` (bytewise).
///
/// # Errors
/// If either side fails to parse or the type has no ordering.
pub fn compare_typed(ty: ValueType, a: &[u8], b: &[u8]) -> Result<Ordering, String> {
    fn text(raw: &[u8]) -> Result<&str, String> {
        std::str::from_utf8(raw)
            .map(str::trim)
            .map_err(|e| e.to_string())
    }
    match ty {
        ValueType::String => Ok(a.cmp(b)),
        ValueType::Integer => {
            let (x, y) = (text(a)?, text(b)?);
            let x: i64 = x.parse().map_err(|_| format!("invalid integer {x:?}"))?;
            let y: i64 = y.parse().map_err(|_| format!("invalid integer {y:?}"))?;
            Ok(x.cmp(&y))
        }
        ValueType::Number => {
            let (x, y) = (text(a)?, text(b)?);
            let x: f64 = x.parse().map_err(|_| format!("invalid number {x:?}"))?;
            let y: f64 = y.parse().map_err(|_| format!("invalid number {y:?}"))?;
            Ok(x.total_cmp(&y))
        }
        other => Err(format!("cannot compare values of type {other}")),
    }
}

/// Locale-independent text form of a value, as written into CSV and XLSX
/// cells. Null is empty; objects and arrays are compact JSON.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
