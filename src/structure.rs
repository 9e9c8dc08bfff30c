//! The `Structure` descriptor: encoding format, format options, schema, and
//! compression.
//!
//! A [`Structure`] is a passive value. Readers and writers consult it at
//! construction time to decide how bytes map to entries; nothing here does
//! I/O. It round-trips through JSON as
//! `{"format", "formatConfig"?, "schema", "compression"?}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::ValueType;

/// Encoding format of a dataset body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataFormat {
    #[default]
    Unknown,
    Csv,
    Json,
    Ndjson,
    Cbor,
    Xlsx,
}

impl DataFormat {
    /// Canonical lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Cbor => "cbor",
            Self::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "cbor" => Ok(Self::Cbor),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl From<String> for DataFormat {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }
}

impl From<DataFormat> for String {
    fn from(f: DataFormat) -> Self {
        f.as_str().to_string()
    }
}

/// Shape of the top level of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RootType {
    /// Ordered rows; entries carry an index.
    Array,
    /// Keyed entries; entries carry a key.
    Object,
}

/// A named, typed column declared by the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub ty: ValueType,
}

/// Format, options, schema, and compression of a dataset body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub format: DataFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_config: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl Structure {
    #[must_use]
    pub const fn new(format: DataFormat) -> Self {
        Self {
            format,
            format_config: None,
            schema: None,
            compression: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_compression(mut self, name: impl Into<String>) -> Self {
        self.compression = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_format_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_format_option(key, value);
        self
    }

    /// Sets a single `formatConfig` key, creating the bag if needed.
    pub fn set_format_option(&mut self, key: &str, value: impl Into<Value>) {
        self.format_config
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
    }

    /// The compression name, with empty strings treated as absent.
    #[must_use]
    pub fn compression_name(&self) -> Option<&str> {
        self.compression
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Root type declared by the schema.
    ///
    /// # Errors
    /// [`Error::SchemaRequired`] without a schema, [`Error::InvalidRootType`]
    /// when the root `type` is anything but `array` or `object`.
    pub fn root_type(&self) -> Result<RootType> {
        let schema = self
            .schema
            .as_ref()
            .ok_or(Error::SchemaRequired(self.format))?;
        match schema.get("type").and_then(Value::as_str) {
            Some("array") => Ok(RootType::Array),
            Some("object") => Ok(RootType::Object),
            Some(other) => Err(Error::InvalidRootType(other.to_string())),
            None => Err(Error::InvalidRootType("<missing>".to_string())),
        }
    }

    /// Columns declared for each row.
    ///
    /// Reads the ordered tuple form `schema.items.items: [{title, type}]`
    /// first, then falls back to `schema.items.properties`. Missing titles
    /// become `field_N` (1-based).
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let Some(items) = self.schema.as_ref().and_then(|s| s.get("items")) else {
            return Vec::new();
        };
        if let Some(list) = items.get("items").and_then(Value::as_array) {
            return list
                .iter()
                .enumerate()
                .map(|(i, col)| Column {
                    title: col
                        .get("title")
                        .and_then(Value::as_str)
                        .map_or_else(|| format!("field_{}", i + 1), str::to_string),
                    ty: column_type(col),
                })
                .collect();
        }
        if let Some(props) = items.get("properties").and_then(Value::as_object) {
            return props
                .iter()
                .map(|(title, col)| Column {
                    title: title.clone(),
                    ty: column_type(col),
                })
                .collect();
        }
        Vec::new()
    }

    fn options<T: serde::de::DeserializeOwned + Default>(&self) -> Result<T> {
        match &self.format_config {
            Some(cfg) => Ok(serde_json::from_value(Value::Object(cfg.clone()))?),
            None => Ok(T::default()),
        }
    }
}

fn column_type(col: &Value) -> ValueType {
    col.get("type")
        .and_then(Value::as_str)
        .map_or(ValueType::Unknown, ValueType::from_name)
}

/* ===================== format options ===================== */

/// CSV options read from `formatConfig`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CsvOptions {
    /// First record is a header row, not data.
    pub header_row: bool,
    /// Tolerate stray quotes inside unquoted fields.
    pub lazy_quotes: bool,
    /// Single-character field separator.
    pub separator: char,
    /// Records may carry differing field counts.
    pub variadic_fields: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            header_row: false,
            lazy_quotes: false,
            separator: ',',
            variadic_fields: false,
        }
    }
}

impl CsvOptions {
    /// Parses options from a structure's `formatConfig`.
    ///
    /// # Errors
    /// Wrongly typed keys, or a separator that is not a single ASCII byte.
    pub fn from_structure(st: &Structure) -> Result<Self> {
        let opts: Self = st.options()?;
        if !opts.separator.is_ascii() {
            return Err(Error::decode(
                DataFormat::Csv,
                format!("separator {:?} must be a single ASCII character", opts.separator),
            ));
        }
        Ok(opts)
    }

    /// Separator as the byte the CSV scanner expects.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        // from_structure guarantees ASCII
        u8::try_from(u32::from(self.separator)).unwrap_or(b',')
    }
}

/// Spreadsheet options read from `formatConfig`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XlsxOptions {
    pub sheet_name: String,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl XlsxOptions {
    /// # Errors
    /// Wrongly typed keys.
    pub fn from_structure(st: &Structure) -> Result<Self> {
        st.options()
    }
}

/// Default upper bound on a single NDJSON line (5 MiB).
pub const DEFAULT_MAX_LINE_SIZE: usize = 5 * 1024 * 1024;

/// NDJSON options read from `formatConfig`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NdjsonOptions {
    /// Lines longer than this many bytes are a decode error.
    pub max_line_size: usize,
}

impl Default for NdjsonOptions {
    fn default() -> Self {
        Self {
            max_line_size: DEFAULT_MAX_LINE_SIZE,
        }
    }
}

impl NdjsonOptions {
    /// # Errors
    /// Wrongly typed keys.
    pub fn from_structure(st: &Structure) -> Result<Self> {
        st.options()
    }
}
