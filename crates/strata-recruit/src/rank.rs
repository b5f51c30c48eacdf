use nalgebra::{DMatrix, RowDVector};
use serde::{Deserialize, Serialize};
use strata_cluster::StratumAssignment;
use strata_core::{ErrorInfo, StrataError, StratumId, UnitId};
use strata_prep::PreparedTable;

/// Variance substituted for variables that are constant within a stratum.
pub const VARIANCE_EPSILON: f64 = 1e-8;

/// One unit of a ranked recruitment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUnit {
    /// Position in the list, starting at 1 for the most typical unit.
    pub rank: usize,
    /// Unit identifier.
    pub unit_id: UnitId,
    /// Mahalanobis distance to the stratum centroid.
    pub distance: f64,
}

/// Units of one stratum ordered from most to least representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentList {
    /// Stratum label.
    pub stratum: StratumId,
    /// Ranked units.
    pub units: Vec<RankedUnit>,
}

impl RecruitmentList {
    /// Number of units in the stratum.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the stratum is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Identifiers in rank order.
    pub fn unit_ids(&self) -> impl Iterator<Item = &UnitId> + '_ {
        self.units.iter().map(|unit| &unit.unit_id)
    }
}

/// Ranks the prepared rows `rows` of one stratum by their Mahalanobis
/// distance to the stratum centroid under a diagonal covariance.
///
/// Zero variances are replaced by [`VARIANCE_EPSILON`]; ties keep table order.
pub fn rank_stratum(
    prepared: &PreparedTable,
    stratum: StratumId,
    rows: &[usize],
) -> Result<RecruitmentList, StrataError> {
    let m = rows.len();
    let v = prepared.n_columns();
    if m == 0 {
        return Ok(RecruitmentList {
            stratum,
            units: Vec::new(),
        });
    }
    let data = DMatrix::from_fn(m, v, |r, c| prepared.value(rows[r], c));
    let centroid = data.row_mean();
    let mut degenerate = 0usize;
    let variances = RowDVector::from_iterator(
        v,
        data.column_iter().map(|column| {
            let variance = if m < 2 {
                0.0
            } else {
                column.variance() * m as f64 / (m - 1) as f64
            };
            if variance > 0.0 {
                variance
            } else {
                degenerate += 1;
                VARIANCE_EPSILON
            }
        }),
    );
    if degenerate > 0 {
        tracing::warn!(
            stratum,
            variables = degenerate,
            "zero within-stratum variance replaced by epsilon"
        );
    }

    let mut scored: Vec<(usize, f64)> = (0..m)
        .map(|r| {
            let diff = data.row(r).clone_owned() - &centroid;
            let squared = diff.component_div(&variances).dot(&diff);
            (rows[r], squared.max(0.0).sqrt())
        })
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    let units = scored
        .into_iter()
        .enumerate()
        .map(|(position, (row, distance))| RankedUnit {
            rank: position + 1,
            unit_id: prepared.ids()[row].clone(),
            distance,
        })
        .collect();
    Ok(RecruitmentList { stratum, units })
}

/// Builds the ranked recruitment list of every stratum.
pub fn rank_units(
    prepared: &PreparedTable,
    assignment: &StratumAssignment,
) -> Result<Vec<RecruitmentList>, StrataError> {
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
    assignment
        .strata()
        .map(|stratum| rank_stratum(prepared, stratum, &assignment.members(stratum)))
        .collect()
}
