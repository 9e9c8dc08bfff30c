//! XLSX entry reader and writer (feature `io-xlsx`).
//!
//! One worksheet per body, named by `formatConfig.sheetName` (default
//! `Sheet1`). Each row is one array-valued entry.
//!
//! Reading coerces every cell's text to its column's declared type and falls
//! back to the raw text when that fails, so cell content never fails a row.
//! A `null` column always yields null.
//!
//! Writing is buffered into an in-memory workbook; the container bytes are
//! produced on `close`.

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;
use std::io::{Cursor, Read, Write};
use tracing::{debug, trace};

use crate::entry::{Entry, EntryReader, EntryWriter};
use crate::error::{Error, Result};
use crate::io::json::root_or_array;
use crate::structure::{Column, RootType, Structure, XlsxOptions};
use crate::value::{ValueType, coerce_str, stringify};

/// Columns per worksheet in the XLSX container.
const MAX_COLUMNS: usize = 16_384;
/// Rows per worksheet in the XLSX container.
const MAX_ROWS: usize = 1_048_576;

/// Spreadsheet column letters for a zero-based index: 0 → `A`, 25 → `Z`,
/// 26 → `AA`.
#[must_use]
pub fn column_name(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Cell address for zero-based `col`/`row`, e.g. `(1, 0)` → `B1`.
#[must_use]
pub fn cell_name(col: usize, row: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

fn ensure_uncompressed(st: &Structure) -> Result<()> {
    match st.compression_name() {
        Some(name) => Err(Error::UnsupportedCompression(format!(
            "{name} (xlsx bodies are never compressed)"
        ))),
        None => Ok(()),
    }
}

fn ensure_array_root(st: &Structure) -> Result<()> {
    if root_or_array(st)? == RootType::Object {
        return Err(Error::InvalidRootType(
            "object (worksheet rows are unkeyed)".to_string(),
        ));
    }
    Ok(())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        #[allow(clippy::cast_possible_truncation)]
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

/// Reads worksheet rows as array-valued entries.
pub struct XlsxReader {
    st: Structure,
    columns: Vec<Column>,
    rows: std::vec::IntoIter<Vec<Data>>,
    /// Column offset of the sheet's used range.
    first_col: usize,
    index: usize,
}

impl XlsxReader {
    /// Buffers the whole container (it needs random access) and loads the
    /// configured sheet.
    ///
    /// # Errors
    /// Compression on the structure, an object root, an unreadable
    /// container, or a missing sheet.
    pub fn new(st: &Structure, mut reader: Box<dyn Read>) -> Result<Self> {
        ensure_uncompressed(st)?;
        ensure_array_root(st)?;
        let options = XlsxOptions::from_structure(st)?;

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        let range = workbook.worksheet_range(&options.sheet_name)?;
        let first_col = range.start().map_or(0, |(_, col)| col as usize);
        let rows: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
        debug!(sheet = %options.sheet_name, rows = rows.len(), "xlsx reader ready");

        Ok(Self {
            st: st.clone(),
            columns: st.columns(),
            rows: rows.into_iter(),
            first_col,
            index: 0,
        })
    }

    fn to_value(&self, row: &[Data]) -> Value {
        let used = row
            .iter()
            .rposition(|c| !matches!(c, Data::Empty))
            .map_or(0, |last| last + 1);
        if used == 0 {
            return Value::Array(Vec::new());
        }
        let mut out = Vec::with_capacity(self.first_col + used);
        let cells = std::iter::repeat_n(&Data::Empty, self.first_col).chain(&row[..used]);
        for (col, cell) in cells.enumerate() {
            let ty = self.columns.get(col).map_or(ValueType::String, |c| c.ty);
            let text = cell_text(cell);
            let value = coerce_str(&text, ty).unwrap_or_else(|reason| {
                trace!(cell = %cell_name(col, self.index), %reason, "keeping raw cell text");
                Value::String(text)
            });
            out.push(value);
        }
        Value::Array(out)
    }
}

impl EntryReader for XlsxReader {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_entry(&mut self) -> Result<Entry> {
        let Some(row) = self.rows.next() else {
            return Err(Error::EndOfEntries);
        };
        let entry = Entry::indexed(self.index, self.to_value(&row));
        self.index += 1;
        Ok(entry)
    }
}

/// Buffers rows into a worksheet and writes the workbook on close.
pub struct XlsxWriter {
    st: Structure,
    columns: Vec<Column>,
    sheet: Option<Worksheet>,
    writer: Option<Box<dyn Write>>,
    row: usize,
}

impl XlsxWriter {
    /// # Errors
    /// Compression on the structure, an object root, or an invalid sheet
    /// name.
    pub fn new(st: &Structure, writer: Box<dyn Write>) -> Result<Self> {
        ensure_uncompressed(st)?;
        ensure_array_root(st)?;
        let options = XlsxOptions::from_structure(st)?;
        let mut sheet = Worksheet::new();
        sheet.set_name(&options.sheet_name)?;
        Ok(Self {
            st: st.clone(),
            columns: st.columns(),
            sheet: Some(sheet),
            writer: Some(writer),
            row: 0,
        })
    }

    fn cells<'a>(&self, value: &'a Value) -> Result<Vec<Option<&'a Value>>> {
        match value {
            Value::Array(items) => Ok(items.iter().map(Some).collect()),
            Value::Object(map) if !self.columns.is_empty() => {
                Ok(self.columns.iter().map(|c| map.get(&c.title)).collect())
            }
            Value::Object(_) => Err(Error::UnsupportedValueShape(
                "object row without declared columns".to_string(),
            )),
            scalar => Err(Error::UnsupportedValueShape(format!(
                "worksheet rows must be arrays, found {}",
                ValueType::of(scalar)
            ))),
        }
    }
}

impl EntryWriter for XlsxWriter {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_entry(&mut self, entry: Entry) -> Result<()> {
        let cells = self.cells(&entry.value)?;
        let row = self.row;
        let sheet = self.sheet.as_mut().ok_or(Error::Closed("xlsx writer"))?;
        if row >= MAX_ROWS || cells.len() > MAX_COLUMNS {
            return Err(Error::UnsupportedValueShape(format!(
                "row does not fit the worksheet (last cell {})",
                cell_name(cells.len().saturating_sub(1), row)
            )));
        }
        for (col, cell) in cells.into_iter().enumerate() {
            let text = match cell {
                None | Some(Value::Null) => continue,
                Some(v) => stringify(v),
            };
            // bounds checked above
            sheet
                .write_string(row as u32, col as u16, text)
                .map_err(|e| Error::Xlsx(format!("{}: {e}", cell_name(col, row))))?;
        }
        self.row += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let (Some(sheet), Some(mut writer)) = (self.sheet.take(), self.writer.take()) else {
            return Ok(());
        };
        let mut workbook = Workbook::new();
        workbook.push_worksheet(sheet);
        let bytes = workbook.save_to_buffer()?;
        debug!(rows = self.row, bytes = bytes.len(), "xlsx writer saved workbook");
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
        assert_eq!(cell_name(1, 0), "B1");
    }

    #[test]
    fn whole_floats_read_as_integers() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
