// src/sheet.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::utils::error::WorkbookError;

/// A single workbook cell. `Check` marks entries an analyst has to resolve
/// by hand (free-form "Other" answers and similar); it renders as the
/// literal string `Check` when persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Check,
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(t) => serializer.serialize_str(t),
            CellValue::Check => serializer.serialize_str("Check"),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => CellValue::Number(n),
            Raw::Text(t) if t == "Check" => CellValue::Check,
            Raw::Text(t) => CellValue::Text(t),
        })
    }
}

/// One sheet of the output workbook, keyed by `A1`-style cell addresses.
/// Population is presence based: a cell holding 0.0 counts as filled, so
/// re-running a response never overwrites a legitimate zero.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(flatten)]
    cells: BTreeMap<String, CellValue>,
}

impl Sheet {
    pub fn get(&self, cell: &str) -> Option<&CellValue> {
        self.cells.get(cell)
    }

    /// Text content of a cell, `None` for numbers, `Check` and empties.
    pub fn text(&self, cell: &str) -> Option<&str> {
        match self.cells.get(cell) {
            Some(CellValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn set(&mut self, cell: impl Into<String>, value: CellValue) {
        self.cells.insert(cell.into(), value);
    }

    pub fn set_number(&mut self, cell: impl Into<String>, value: f64) {
        self.set(cell, CellValue::Number(value));
    }

    pub fn set_text(&mut self, cell: impl Into<String>, value: impl Into<String>) {
        self.set(cell, CellValue::Text(value.into()));
    }

    pub fn set_check(&mut self, cell: impl Into<String>) {
        self.set(cell, CellValue::Check);
    }

    pub fn is_populated(&self, cell: &str) -> bool {
        self.cells.contains_key(cell)
    }

    pub fn any_populated(&self, cells: &[(char, u32)]) -> bool {
        cells
            .iter()
            .any(|&(col, row)| self.is_populated(&cell_ref(col, row)))
    }

    /// Adds to a numeric cell, setting it when absent. Non-numeric
    /// contents are replaced.
    pub fn add_number(&mut self, cell: &str, value: f64) {
        match self.cells.get_mut(cell) {
            Some(CellValue::Number(existing)) => *existing += value,
            _ => {
                self.cells.insert(cell.to_string(), CellValue::Number(value));
            }
        }
    }

    /// Appends to a text cell, setting it when absent. A `Check` marker in
    /// the cell is kept as a visible `Check` prefix.
    pub fn append_text(&mut self, cell: &str, suffix: &str) {
        match self.cells.get_mut(cell) {
            Some(CellValue::Text(existing)) => existing.push_str(suffix),
            Some(entry @ CellValue::Check) => {
                *entry = CellValue::Text(format!("Check{}", suffix));
            }
            _ => {
                self.cells
                    .insert(cell.to_string(), CellValue::Text(suffix.to_string()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The four-sheet output workbook. Persisted as pretty JSON keyed by sheet
/// and cell so diffs across runs stay readable.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(rename = "Emissions")]
    pub emissions: Sheet,
    #[serde(rename = "Energy")]
    pub energy: Sheet,
    #[serde(rename = "S2 MB sourcing")]
    pub sourcing: Sheet,
    #[serde(rename = "Energy Utility specific")]
    pub utilities: Sheet,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, WorkbookError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// `A1`-style address from column letter and row number.
pub fn cell_ref(col: char, row: u32) -> String {
    format!("{}{}", col, row)
}

/// Column letter for a version, counting up from `base` at 2016. Version
/// columns run in lockstep across all sheets.
pub fn version_column(base: char, version: i32) -> char {
    (base as u8 + (version - 2016) as u8) as char
}

/// Column letter `by` positions to the right of `col`.
pub fn column_offset(col: char, by: u8) -> char {
    (col as u8 + by) as char
}
