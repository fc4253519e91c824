//! In-memory tables for snapshots and the ledger
//!
//! A `Table` is an ordered list of column names plus rows of `CellValue`s.
//! Column names may repeat: the column-wise ledger merge places two copies
//! of the same schema side by side. Name-based alignment matches the n-th
//! occurrence of a name in one table with the n-th occurrence in the other.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::ser::{Serialize, SerializeMap, Serializer};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell, tagged with the type the reader inferred
#[derive(Debug, Clone, Default)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Infer a typed value from CSV text
    ///
    /// Empty text is `Empty`; integers, floats, booleans (`True`/`False`)
    /// and ISO dates are recognized; anything else stays a string.
    pub fn infer(text: &str) -> Self {
        if text.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(i) = text.parse::<i64>() {
            return CellValue::Int(i);
        }
        // Only treat digit-bearing text as a float so words like "inf" or
        // "nan" in a name column stay strings
        if text.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = text.parse::<f64>() {
                return CellValue::Float(f);
            }
        }
        match text {
            "True" | "TRUE" | "true" => return CellValue::Bool(true),
            "False" | "FALSE" | "false" => return CellValue::Bool(false),
            _ => {}
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
            return CellValue::DateTime(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
            return CellValue::DateTime(d.and_time(NaiveTime::MIN));
        }
        CellValue::String(text.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

// Exact equality: floats compare by bit pattern so NaN cells deduplicate
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::String(s) => s.hash(state),
            CellValue::Int(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::DateTime(dt) if dt.time().num_seconds_from_midnight() == 0 => {
                write!(f, "{}", dt.format(DATE_FORMAT))
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::DateTime(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// One row as an ordered mapping from column name to value
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new(fields: Vec<(String, CellValue)>) -> Self {
        Self { fields }
    }

    /// Value of the first column with this name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, CellValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A rectangular table; every row has exactly one value per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, padding short rows with `Empty` and truncating long ones
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Rows as column-name → value records
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                Record::new(
                    self.columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect(),
                )
            })
            .collect()
    }

    /// Stack `other`'s rows under this table's rows
    ///
    /// Columns are aligned by name. The result has this table's columns
    /// followed by any columns only `other` has; cells a table lacks are
    /// `Empty`.
    pub fn stack(&self, other: &Table) -> Table {
        let self_keys = occurrence_keys(&self.columns);
        let other_keys = occurrence_keys(&other.columns);

        let mut keys = self_keys.clone();
        let known: HashSet<_> = self_keys.iter().cloned().collect();
        for key in &other_keys {
            if !known.contains(key) {
                keys.push(key.clone());
            }
        }

        let columns: Vec<String> = keys.iter().map(|(name, _)| name.clone()).collect();
        let mut stacked = Table::new(columns);
        for row in &self.rows {
            stacked.push_row(row.clone());
        }

        let other_index: HashMap<_, _> = other_keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        for row in &other.rows {
            let aligned = keys
                .iter()
                .map(|key| {
                    other_index
                        .get(key)
                        .map(|&i| row[i].clone())
                        .unwrap_or_default()
                })
                .collect();
            stacked.push_row(aligned);
        }

        stacked
    }

    /// Place `other`'s columns to the right of this table's columns
    ///
    /// Rows are aligned by position; the shorter table is padded with
    /// `Empty` rows.
    pub fn concat_columns(&self, other: &Table) -> Table {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());

        let height = self.len().max(other.len());
        let mut joined = Table::new(columns);
        for i in 0..height {
            let mut row = self
                .rows
                .get(i)
                .cloned()
                .unwrap_or_else(|| vec![CellValue::Empty; self.width()]);
            match other.rows.get(i) {
                Some(right) => row.extend(right.iter().cloned()),
                None => row.extend(std::iter::repeat(CellValue::Empty).take(other.width())),
            }
            joined.push_row(row);
        }
        joined
    }

    /// Remove rows that exactly duplicate an earlier row
    pub fn drop_duplicates(&self) -> Table {
        let mut seen = HashSet::new();
        let rows = self
            .rows
            .iter()
            .filter(|row| seen.insert(*row))
            .cloned()
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Keep only rows that occur exactly once
    pub fn unique_rows(&self) -> Table {
        let mut counts: HashMap<&Vec<CellValue>, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(row).or_insert(0) += 1;
        }
        let rows = self
            .rows
            .iter()
            .filter(|row| counts.get(row).copied() == Some(1))
            .cloned()
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// Pair each column name with its occurrence number among equal names
fn occurrence_keys(columns: &[String]) -> Vec<(String, usize)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    columns
        .iter()
        .map(|name| {
            let n = seen.entry(name.as_str()).or_insert(0);
            let key = (name.clone(), *n);
            *n += 1;
            key
        })
        .collect()
}
