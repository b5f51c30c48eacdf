use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strata_core::{
    Cell, Column, ErrorInfo, PopulationTable, StrataError, StratifyingVariable, UnitId,
    VariableKind,
};

use crate::hash::fingerprint_prepared;

fn config_error(code: &str, message: impl Into<String>, variable: &str) -> StrataError {
    StrataError::Config(ErrorInfo::new(code, message).with_context("variable", variable))
}

/// Interpretation of a prepared numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Continuous variable copied unchanged.
    Continuous,
    /// 0/1 indicator produced from a categorical level.
    Indicator,
}

/// Descriptor of one column of the prepared matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedColumn {
    /// Column name; indicators are named `<variable>_<level>`.
    pub name: String,
    /// Stratifying variable the column was derived from.
    pub source: String,
    /// Column interpretation.
    pub kind: ColumnKind,
}

/// Fully numeric, complete-case unit-by-column matrix.
///
/// Identifiers are stored apart from the matrix so they can never be used as
/// covariates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedTable {
    id_column: String,
    variables: Vec<StratifyingVariable>,
    excluded: Vec<String>,
    ids: Vec<UnitId>,
    dropped: Vec<UnitId>,
    columns: Vec<PreparedColumn>,
    values: Vec<f64>,
}

impl PreparedTable {
    /// Name of the identifier column.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Stratifying variables that contributed columns.
    pub fn variables(&self) -> &[StratifyingVariable] {
        &self.variables
    }

    /// Variables skipped because every value was missing.
    pub fn excluded_variables(&self) -> &[String] {
        &self.excluded
    }

    /// Identifiers of retained units in row order.
    pub fn ids(&self) -> &[UnitId] {
        &self.ids
    }

    /// Identifiers of units removed by complete-case filtering.
    pub fn dropped(&self) -> &[UnitId] {
        &self.dropped
    }

    /// Column descriptors in matrix order.
    pub fn columns(&self) -> &[PreparedColumn] {
        &self.columns
    }

    /// Number of retained units.
    pub fn n_units(&self) -> usize {
        self.ids.len()
    }

    /// Number of numeric columns after expansion.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row-major view of one unit.
    pub fn row(&self, unit: usize) -> &[f64] {
        let width = self.columns.len();
        &self.values[unit * width..(unit + 1) * width]
    }

    /// Single matrix entry.
    pub fn value(&self, unit: usize, column: usize) -> f64 {
        self.values[unit * self.columns.len() + column]
    }

    /// Iterates the values of one column in unit order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.n_units()).map(move |unit| self.value(unit, column))
    }

    /// Row-major backing storage.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// SHA-256 fingerprint over identifiers, column names and value bits.
    pub fn fingerprint(&self) -> String {
        fingerprint_prepared(self)
    }
}

struct ExpandedColumn {
    descriptor: PreparedColumn,
    values: Vec<f64>,
}

fn validate_selection(
    table: &PopulationTable,
    id_column: &str,
    variables: &[StratifyingVariable],
) -> Result<(), StrataError> {
    if table.column(id_column).is_none() {
        return Err(StrataError::Config(
            ErrorInfo::new("unknown-id-column", "identifier column not found in table")
                .with_context("column", id_column),
        ));
    }
    if variables.is_empty() {
        return Err(StrataError::config(
            "no-variables",
            "at least one stratifying variable is required",
        ));
    }
    let mut seen = BTreeSet::new();
    for variable in variables {
        if variable.name == id_column {
            return Err(config_error(
                "id-as-variable",
                "the identifier column cannot be a stratifying variable",
                &variable.name,
            ));
        }
        if table.column(&variable.name).is_none() {
            return Err(config_error(
                "unknown-variable",
                "stratifying variable not found in table",
                &variable.name,
            ));
        }
        if !seen.insert(variable.name.as_str()) {
            return Err(config_error(
                "duplicate-variable",
                "stratifying variable listed more than once",
                &variable.name,
            ));
        }
    }
    Ok(())
}

fn sorted_levels(column: &Column) -> Vec<String> {
    let labels: BTreeSet<String> = column.cells.iter().filter_map(Cell::level_label).collect();
    let mut levels: Vec<String> = labels.into_iter().collect();
    let numeric: Option<Vec<f64>> = levels.iter().map(|l| l.parse::<f64>().ok()).collect();
    if let Some(keys) = numeric {
        let mut paired: Vec<(f64, String)> = keys.into_iter().zip(levels).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));
        levels = paired.into_iter().map(|(_, label)| label).collect();
    }
    levels
}

fn expand_continuous(column: &Column) -> Result<ExpandedColumn, StrataError> {
    let mut values = Vec::with_capacity(column.cells.len());
    for (row, cell) in column.cells.iter().enumerate() {
        values.push(match cell {
            Cell::Number(value) if value.is_finite() => *value,
            Cell::Number(_) | Cell::Missing => f64::NAN,
            Cell::Text(text) => {
                return Err(StrataError::Data(
                    ErrorInfo::new(
                        "non-numeric-value",
                        "continuous variable contains a non-numeric value",
                    )
                    .with_context("variable", &column.name)
                    .with_context("row", row)
                    .with_context("value", text)
                    .with_hint("declare the variable as categorical"),
                ))
            }
        });
    }
    Ok(ExpandedColumn {
        descriptor: PreparedColumn {
            name: column.name.clone(),
            source: column.name.clone(),
            kind: ColumnKind::Continuous,
        },
        values,
    })
}

fn expand_categorical(column: &Column) -> Vec<ExpandedColumn> {
    let levels = sorted_levels(column);
    let labels: Vec<Option<String>> = column.cells.iter().map(Cell::level_label).collect();
    if levels.len() < 2 {
        tracing::warn!(
            variable = %column.name,
            levels = levels.len(),
            "categorical variable has a single level and contributes no indicator columns"
        );
    }
    levels
        .iter()
        .skip(1)
        .map(|level| ExpandedColumn {
            descriptor: PreparedColumn {
                name: format!("{}_{}", column.name, level),
                source: column.name.clone(),
                kind: ColumnKind::Indicator,
            },
            values: labels
                .iter()
                .map(|label| match label {
                    Some(label) if label == level => 1.0,
                    Some(_) => 0.0,
                    None => f64::NAN,
                })
                .collect(),
        })
        .collect()
}

/// Selects the stratifying variables, expands categoricals into `levels - 1`
/// indicators (the first sorted level is the reference) and drops every unit
/// with a missing value in any selected variable.
///
/// Variables whose values are all missing are excluded with a warning rather
/// than emptying the population.
pub fn prepare_table(
    table: &PopulationTable,
    id_column: &str,
    variables: &[StratifyingVariable],
) -> Result<PreparedTable, StrataError> {
    validate_selection(table, id_column, variables)?;
    let ids = table.unit_ids(id_column)?;

    let mut kept_variables = Vec::new();
    let mut excluded = Vec::new();
    let mut expanded: Vec<ExpandedColumn> = Vec::new();
    let mut missing_rows = BTreeSet::new();
    for variable in variables {
        let column = table
            .column(&variable.name)
            .ok_or_else(|| {
                config_error(
                    "unknown-variable",
                    "stratifying variable not found in table",
                    &variable.name,
                )
            })?;
        if column.cells.iter().all(Cell::is_missing) {
            tracing::warn!(variable = %variable.name, "variable is entirely missing and is excluded");
            excluded.push(variable.name.clone());
            continue;
        }
        for (row, cell) in column.cells.iter().enumerate() {
            if cell.is_missing() {
                missing_rows.insert(row);
            }
        }
        match variable.kind {
            VariableKind::Continuous => expanded.push(expand_continuous(column)?),
            VariableKind::Categorical => expanded.extend(expand_categorical(column)),
        }
        kept_variables.push(variable.clone());
    }
    if kept_variables.is_empty() {
        return Err(StrataError::data(
            "no-usable-variables",
            "every stratifying variable is entirely missing",
        ));
    }

    let mut retained_ids = Vec::new();
    let mut dropped = Vec::new();
    let mut values = Vec::with_capacity(ids.len() * expanded.len());
    for (row, id) in ids.into_iter().enumerate() {
        if missing_rows.contains(&row) {
            dropped.push(id);
            continue;
        }
        values.extend(expanded.iter().map(|column| column.values[row]));
        retained_ids.push(id);
    }
    if retained_ids.is_empty() {
        return Err(StrataError::Data(
            ErrorInfo::new(
                "no-complete-records",
                "no unit has values for every stratifying variable",
            )
            .with_context("dropped", dropped.len()),
        ));
    }
    if !dropped.is_empty() {
        tracing::warn!(
            dropped = dropped.len(),
            retained = retained_ids.len(),
            "dropped units with missing stratifying values"
        );
    }
    tracing::debug!(
        units = retained_ids.len(),
        columns = expanded.len(),
        "prepared stratifying matrix"
    );

    Ok(PreparedTable {
        id_column: id_column.to_string(),
        variables: kept_variables,
        excluded,
        ids: retained_ids,
        dropped,
        columns: expanded.into_iter().map(|column| column.descriptor).collect(),
        values,
    })
}
