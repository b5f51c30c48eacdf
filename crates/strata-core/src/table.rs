//! In-memory population table supplied by callers.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, StrataError};

/// A single cell of the population table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value.
    Number(f64),
    /// Free text or categorical label.
    Text(String),
    /// Missing value.
    Missing,
}

impl Cell {
    /// Parses a raw textual field; empty fields and `NA` are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            Ok(_) => Cell::Missing,
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    /// Returns whether the cell is missing. Non-finite numbers count as
    /// missing whichever way the cell was built.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Number(value) => !value.is_finite(),
            Cell::Text(_) => false,
        }
    }

    /// Label used when the cell acts as a categorical level.
    pub fn level_label(&self) -> Option<String> {
        match self {
            Cell::Number(value) if value.is_finite() => Some(format_number(*value)),
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(_) | Cell::Missing => None,
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Unique identifier of a population unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitId {
    /// Integral identifier.
    Int(i64),
    /// Textual identifier.
    Text(String),
}

impl UnitId {
    /// Converts an identifier cell; missing cells have no identifier.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
                Some(UnitId::Int(*value as i64))
            }
            Cell::Number(value) if value.is_finite() => Some(UnitId::Text(format!("{value}"))),
            Cell::Text(text) => Some(UnitId::Text(text.clone())),
            Cell::Number(_) | Cell::Missing => None,
        }
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Int(value) => write!(f, "{value}"),
            UnitId::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for UnitId {
    fn from(value: i64) -> Self {
        UnitId::Int(value)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        UnitId::Text(value.to_string())
    }
}

/// Measurement kind of a stratifying variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Numeric variable used as-is.
    Continuous,
    /// Nominal variable expanded into indicator columns.
    Categorical,
}

/// Stratifying variable resolved against a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifyingVariable {
    /// Column name in the population table.
    pub name: String,
    /// Measurement kind.
    pub kind: VariableKind,
}

impl StratifyingVariable {
    /// Creates a continuous variable descriptor.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Continuous,
        }
    }

    /// Creates a categorical variable descriptor.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Categorical,
        }
    }
}

/// Named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column header.
    pub name: String,
    /// Cells in row order.
    pub cells: Vec<Cell>,
}

impl Column {
    /// Infers the measurement kind: any text cell makes the column categorical.
    pub fn infer_kind(&self) -> VariableKind {
        if self.cells.iter().any(|cell| matches!(cell, Cell::Text(_))) {
            VariableKind::Categorical
        } else {
            VariableKind::Continuous
        }
    }
}

/// Column-oriented population table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl PopulationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a header and row-major records.
    pub fn from_rows(header: &[String], rows: Vec<Vec<Cell>>) -> Result<Self, StrataError> {
        let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); header.len()];
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != header.len() {
                return Err(StrataError::Data(
                    ErrorInfo::new("ragged-row", "row width does not match the header")
                        .with_context("row", row_idx)
                        .with_context("expected", header.len())
                        .with_context("found", row.len()),
                ));
            }
            for (slot, cell) in row.into_iter().enumerate() {
                columns[slot].push(cell);
            }
        }
        let mut table = Self::new();
        for (name, cells) in header.iter().zip(columns) {
            table.push_column(name.clone(), cells)?;
        }
        Ok(table)
    }

    /// Appends a column; all columns must share the same length and unique names.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        cells: Vec<Cell>,
    ) -> Result<(), StrataError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(StrataError::Data(
                ErrorInfo::new("duplicate-column", "column name appears more than once")
                    .with_context("column", &name),
            ));
        }
        if !self.columns.is_empty() && cells.len() != self.n_rows {
            return Err(StrataError::Data(
                ErrorInfo::new("ragged-column", "column length does not match the table")
                    .with_context("column", &name)
                    .with_context("expected", self.n_rows)
                    .with_context("found", cells.len()),
            ));
        }
        self.n_rows = cells.len();
        self.columns.push(Column { name, cells });
        Ok(())
    }

    /// Builder-style variant of [`PopulationTable::push_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        cells: Vec<Cell>,
    ) -> Result<Self, StrataError> {
        self.push_column(name, cells)?;
        Ok(self)
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns all columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows (units) in the table.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Extracts unit identifiers, rejecting missing or duplicate values.
    pub fn unit_ids(&self, id_column: &str) -> Result<Vec<UnitId>, StrataError> {
        let column = self.column(id_column).ok_or_else(|| {
            StrataError::Config(
                ErrorInfo::new("unknown-id-column", "identifier column not found in table")
                    .with_context("column", id_column),
            )
        })?;
        let mut seen = BTreeSet::new();
        let mut ids = Vec::with_capacity(column.cells.len());
        for (row, cell) in column.cells.iter().enumerate() {
            let id = UnitId::from_cell(cell).ok_or_else(|| {
                StrataError::Data(
                    ErrorInfo::new("missing-unit-id", "unit identifier is missing")
                        .with_context("row", row),
                )
            })?;
            if !seen.insert(id.clone()) {
                return Err(StrataError::Data(
                    ErrorInfo::new("duplicate-unit-id", "unit identifiers must be unique")
                        .with_context("row", row)
                        .with_context("id", &id),
                ));
            }
            ids.push(id);
        }
        Ok(ids)
    }
}
