//! Report loading.
//!
//! Reads the Amazon order report either as a spreadsheet (one named sheet)
//! or as the tab-delimited flat file Seller Central downloads. The first row
//! holds column names; every cell is kept as text and blank cells are left
//! out of the row.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};

use crate::domain::aggregates::OrderLine;
use crate::domain::value_objects::format_amount;
use crate::SourceError;

/// Loads every data row of the report at `path`.
///
/// `sheet_name` only applies to spreadsheet formats.
pub fn load_records(path: &Path, sheet_name: &str) -> Result<Vec<OrderLine>, SourceError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_sheet(path, sheet_name),
        "txt" | "tsv" => load_delimited(path, b'\t'),
        "csv" => load_delimited(path, b','),
        _ => Err(SourceError::UnsupportedFormat(path.display().to_string())),
    }
}

fn load_sheet(path: &Path, sheet_name: &str) -> Result<Vec<OrderLine>, SourceError> {
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(SourceError::SheetNotFound(sheet_name.to_string()));
    }
    let range = workbook.worksheet_range(sheet_name)?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else { return Ok(vec![]) };
    let header: Vec<String> = header.iter().map(|c| header_name(&cell_text(c).unwrap_or_default())).collect();

    Ok(rows
        .map(|row| to_line(&header, row.iter().map(cell_text)))
        .filter(|line| *line != OrderLine::default())
        .collect())
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<Vec<OrderLine>, SourceError> {
    // Seller Central flat files are unquoted; a stray `"` in a title must not
    // swallow the rest of the line.
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quoting(delimiter != b'\t')
        .flexible(true)
        .from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(header_name).collect();

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = to_line(&header, record.iter().map(|v| (!v.trim().is_empty()).then(|| v.to_string())));
        if line != OrderLine::default() {
            lines.push(line);
        }
    }
    Ok(lines)
}

fn header_name(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn to_line(header: &[String], cells: impl Iterator<Item = Option<String>>) -> OrderLine {
    header
        .iter()
        .zip(cells)
        .filter(|(name, _)| !name.is_empty())
        .filter_map(|(name, value)| value.map(|v| (name.clone(), v)))
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        // Whole numbers come back as floats; ZIP codes and quantities must
        // keep the digits the sheet shows.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        Data::Float(f) => Some(format_amount(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::DateTime(_) => cell.as_datetime().map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        other => Some(other.to_string()),
    }
}
