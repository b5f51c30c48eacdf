use serde::{Deserialize, Serialize};
use strata_cluster::{ProfileTables, StratumAssignment};
use strata_core::{RunProvenance, SchemaVersion, StratifyingVariable, StratumId, UnitId};
use strata_recruit::RecruitmentPlan;

/// Stratum membership of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStratum {
    /// Unit identifier.
    pub unit_id: UnitId,
    /// Assigned stratum.
    pub stratum: StratumId,
}

/// Everything downstream consumers need from a stratification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratificationReport {
    /// Schema version of the report payload.
    pub schema_version: SchemaVersion,
    /// Inputs the report was derived from.
    pub provenance: RunProvenance,
    /// Identifier column name.
    pub id_column: String,
    /// Stratifying variables with resolved kinds.
    pub variables: Vec<StratifyingVariable>,
    /// Prepared (indicator-expanded) column names.
    pub columns: Vec<String>,
    /// Variables skipped because they were entirely missing.
    pub excluded_variables: Vec<String>,
    /// Units removed by complete-case filtering.
    pub dropped_units: Vec<UnitId>,
    /// Unit to stratum mapping in table order.
    pub units: Vec<UnitStratum>,
    /// Partition and clustering diagnostics.
    pub assignment: StratumAssignment,
    /// Summary and deviation tables.
    pub profile: ProfileTables,
    /// Canonical hash of the report contents (empty while hashing).
    pub report_hash: String,
}

impl StratificationReport {
    /// Share of variation explained by the strata.
    pub fn variance_explained(&self) -> f64 {
        self.assignment.variance_explained
    }

    /// Number of strata.
    pub fn n_strata(&self) -> usize {
        self.assignment.n_strata
    }

    /// Unit identifiers belonging to `stratum`, in table order.
    pub fn stratum_units(&self, stratum: StratumId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|unit| unit.stratum == stratum)
            .map(|unit| unit.unit_id.clone())
            .collect()
    }
}

/// Recruitment plan bound to the stratification it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentReport {
    /// Schema version of the report payload.
    pub schema_version: SchemaVersion,
    /// Hash of the stratification report the plan belongs to.
    pub stratification_hash: String,
    /// Allocation table and ranked lists.
    pub plan: RecruitmentPlan,
}
