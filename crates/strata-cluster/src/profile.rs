use serde::{Deserialize, Serialize};
use strata_core::{ErrorInfo, StrataError, StratumId};
use strata_prep::PreparedTable;

use crate::stats::{mean, sample_sd};
use crate::StratumAssignment;

/// Symmetric bound applied to relative deviations.
pub const DEVIATION_BOUND: f64 = 0.7;

/// Mean and standard deviation of one variable within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSummary {
    /// Prepared column name.
    pub variable: String,
    /// Group mean.
    pub mean: f64,
    /// Sample standard deviation; absent for groups of one unit.
    pub sd: Option<f64>,
}

/// Summary of a stratum or of the whole population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Stratum label, or `None` for the population row.
    pub stratum: Option<StratumId>,
    /// Number of units in the group.
    pub n: usize,
    /// Per-variable statistics in prepared column order.
    pub summaries: Vec<VariableSummary>,
}

/// Relative deviation of a stratum mean from the population mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deviation {
    /// Clipped value in `[-DEVIATION_BOUND, DEVIATION_BOUND]`.
    Value(f64),
    /// Population mean is zero so the ratio has no value.
    Undefined,
}

impl Deviation {
    /// Returns the clipped value when defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Deviation::Value(value) => Some(*value),
            Deviation::Undefined => None,
        }
    }
}

/// One cell of the stratum-by-variable deviation grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationCell {
    /// Stratum label.
    pub stratum: StratumId,
    /// Prepared column name.
    pub variable: String,
    /// Clipped relative deviation.
    pub deviation: Deviation,
}

/// Summary tables describing every stratum against the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTables {
    /// Prepared column names in table order.
    pub variables: Vec<String>,
    /// Population-wide summary.
    pub population: GroupProfile,
    /// Per-stratum summaries ordered by label.
    pub strata: Vec<GroupProfile>,
    /// Deviation grid ordered by stratum then variable.
    pub deviations: Vec<DeviationCell>,
}

impl ProfileTables {
    /// Summary row for one stratum.
    pub fn stratum(&self, stratum: StratumId) -> Option<&GroupProfile> {
        self.strata
            .iter()
            .find(|profile| profile.stratum == Some(stratum))
    }

    /// Deviation for a (stratum, variable) cell.
    pub fn deviation(&self, stratum: StratumId, variable: &str) -> Option<Deviation> {
        self.deviations
            .iter()
            .find(|cell| cell.stratum == stratum && cell.variable == variable)
            .map(|cell| cell.deviation)
    }
}

/// Computes `(stratum_mean - population_mean) / population_mean` clipped to
/// `[-0.7, 0.7]`; a zero population mean yields [`Deviation::Undefined`].
pub fn relative_deviation(stratum_mean: f64, population_mean: f64) -> Deviation {
    if population_mean == 0.0 {
        return Deviation::Undefined;
    }
    let raw = (stratum_mean - population_mean) / population_mean;
    Deviation::Value(raw.clamp(-DEVIATION_BOUND, DEVIATION_BOUND))
}

fn summarise(
    prepared: &PreparedTable,
    stratum: Option<StratumId>,
    rows: &[usize],
) -> GroupProfile {
    let summaries = prepared
        .columns()
        .iter()
        .enumerate()
        .map(|(col, column)| {
            let values: Vec<f64> = rows.iter().map(|&row| prepared.value(row, col)).collect();
            VariableSummary {
                variable: column.name.clone(),
                mean: mean(&values),
                sd: sample_sd(&values),
            }
        })
        .collect();
    GroupProfile {
        stratum,
        n: rows.len(),
        summaries,
    }
}

/// Builds per-stratum and population summaries plus the deviation grid.
pub fn profile_strata(
    prepared: &PreparedTable,
    assignment: &StratumAssignment,
) -> Result<ProfileTables, StrataError> {
    if assignment.labels.len() != prepared.n_units() {
        return Err(StrataError::Data(
            ErrorInfo::new(
                "assignment-size-mismatch",
                "stratum assignment does not cover the prepared units",
            )
            .with_context("labels", assignment.labels.len())
            .with_context("units", prepared.n_units()),
        ));
    }
    assignment.check_labels()?;
    let all_rows: Vec<usize> = (0..prepared.n_units()).collect();
    let population = summarise(prepared, None, &all_rows);
    let strata: Vec<GroupProfile> = assignment
        .strata()
        .map(|stratum| summarise(prepared, Some(stratum), &assignment.members(stratum)))
        .collect();

    let mut deviations = Vec::with_capacity(strata.len() * population.summaries.len());
    let mut undefined = 0usize;
    for profile in &strata {
        let stratum = profile.stratum.unwrap_or_default();
        for (summary, overall) in profile.summaries.iter().zip(&population.summaries) {
            let deviation = relative_deviation(summary.mean, overall.mean);
            if deviation == Deviation::Undefined {
                undefined += 1;
            }
            deviations.push(DeviationCell {
                stratum,
                variable: summary.variable.clone(),
                deviation,
            });
        }
    }
    if undefined > 0 {
        tracing::warn!(
            cells = undefined,
            "population mean is zero for some variables; deviations left undefined"
        );
    }

    Ok(ProfileTables {
        variables: prepared.columns().iter().map(|c| c.name.clone()).collect(),
        population,
        strata,
        deviations,
    })
}
