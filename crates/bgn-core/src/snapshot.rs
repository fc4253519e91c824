//! Snapshot loading
//!
//! Archived action lists are Excel workbooks; the reader dispatches on file
//! extension so CSV exports (and the ledger itself) load through the same
//! `Table` model.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::table::{CellValue, Table};

/// Extensions read through the spreadsheet reader
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Supported snapshot file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Spreadsheet,
    Csv,
}

impl SnapshotFormat {
    /// Pick the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Spreadsheet)
        } else if ext == "csv" {
            Some(Self::Csv)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Load a snapshot or ledger file into a table
pub fn load_table(path: &Path) -> Result<Table> {
    let format = SnapshotFormat::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

    let table = match format {
        SnapshotFormat::Spreadsheet => load_spreadsheet(path)?,
        SnapshotFormat::Csv => read_csv_table(File::open(path)?)?,
    };

    debug!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        table.len(),
        table.width()
    );
    Ok(table)
}

/// Read the first worksheet; its first row holds the column names
pub fn load_spreadsheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        Error::NotFound(format!("No worksheets in {}", path.display()))
    })??;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| column_name(i, &cell.to_string()))
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(cell_from_spreadsheet).collect());
    }
    Ok(table)
}

/// Read CSV with a header row, inferring cell types
pub fn read_csv_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| column_name(i, name))
        .collect();

    let mut table = Table::new(columns);
    for result in rdr.records() {
        let record = result?;
        table.push_row(record.iter().map(CellValue::infer).collect());
    }
    Ok(table)
}

/// Blank headers get a positional name
fn column_name(index: usize, raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        name.to_string()
    }
}

fn cell_from_spreadsheet(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::infer(s)),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}
