use std::collections::BTreeMap;

use strata_cluster::{profile_strata, stratify};
use strata_core::{
    ErrorInfo, EventSink, PipelineEvent, PopulationTable, RunProvenance, SchemaVersion,
    StrataError, StratifyingVariable,
};
use strata_prep::{compute_dissimilarity, prepare_table, DistanceMatrix, PreparedTable};
use strata_recruit::{recruitment_plan, RoundingPolicy};

use crate::config::StudyConfig;
use crate::hash::stable_hash_string;
use crate::report::{RecruitmentReport, StratificationReport, UnitStratum};

/// Schema version emitted with every report.
pub const REPORT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Prepared table and dissimilarity matrix for one configuration.
///
/// Both stay valid while the variable set is unchanged, so several stratum
/// counts can be tried without recomputing them.
#[derive(Debug, Clone)]
pub struct PreparedStudy {
    config: StudyConfig,
    config_hash: String,
    variables: Vec<StratifyingVariable>,
    prepared: PreparedTable,
    distances: DistanceMatrix,
}

impl PreparedStudy {
    /// Validates `config`, prepares the table and computes distances.
    pub fn build(
        table: &PopulationTable,
        config: &StudyConfig,
        sink: &mut dyn EventSink,
    ) -> Result<Self, StrataError> {
        config.validate(table)?;
        let variables = config.resolve_variables(table)?;
        let prepared = prepare_table(table, &config.id_column, &variables)?;
        sink.emit(PipelineEvent::TablePrepared {
            retained: prepared.n_units(),
            dropped: prepared.dropped().len(),
            columns: prepared.n_columns(),
        });
        let distances = compute_dissimilarity(&prepared);
        sink.emit(PipelineEvent::DistanceMatrixComputed {
            units: distances.len(),
        });
        tracing::info!(
            units = prepared.n_units(),
            columns = prepared.n_columns(),
            "study prepared"
        );
        Ok(Self {
            config: config.clone(),
            config_hash: config.config_hash()?,
            variables,
            prepared,
            distances,
        })
    }

    /// Configuration the study was built from.
    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Complete-case, indicator-expanded table.
    pub fn prepared(&self) -> &PreparedTable {
        &self.prepared
    }

    /// Pairwise dissimilarities of the prepared units.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    fn provenance(&self) -> RunProvenance {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(
            "strata-run".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        RunProvenance {
            input_hash: self.prepared.fingerprint(),
            config_hash: self.config_hash.clone(),
            seed: self.config.clustering.seed,
            tool_versions,
        }
    }

    /// Stratifies into `n_strata` strata, reusing prepared data and distances.
    pub fn stratify(
        &self,
        n_strata: usize,
        sink: &mut dyn EventSink,
    ) -> Result<StratificationReport, StrataError> {
        let assignment = stratify(&self.distances, &self.config.cluster_opts(n_strata), sink)?;
        let profile = profile_strata(&self.prepared, &assignment)?;
        let units = self
            .prepared
            .ids()
            .iter()
            .zip(&assignment.labels)
            .map(|(unit_id, &stratum)| UnitStratum {
                unit_id: unit_id.clone(),
                stratum,
            })
            .collect();
        let mut report = StratificationReport {
            schema_version: REPORT_SCHEMA,
            provenance: self.provenance(),
            id_column: self.prepared.id_column().to_string(),
            variables: self.variables.clone(),
            columns: profile.variables.clone(),
            excluded_variables: self.prepared.excluded_variables().to_vec(),
            dropped_units: self.prepared.dropped().to_vec(),
            units,
            assignment,
            profile,
            report_hash: String::new(),
        };
        report.report_hash = stable_hash_string(&report)?;
        Ok(report)
    }

    /// Builds the recruitment plan for a finalized stratification.
    pub fn recruit(
        &self,
        report: &StratificationReport,
        sample_size: usize,
        rounding: RoundingPolicy,
    ) -> Result<RecruitmentReport, StrataError> {
        if report.provenance.input_hash != self.prepared.fingerprint() {
            return Err(StrataError::Data(
                ErrorInfo::new(
                    "report-mismatch",
                    "stratification report was produced from different prepared data",
                )
                .with_context("report_input", &report.provenance.input_hash),
            ));
        }
        let plan = recruitment_plan(&self.prepared, &report.assignment, sample_size, rounding)?;
        tracing::info!(
            sample_size,
            allocated = plan.total_target(),
            "recruitment plan built"
        );
        Ok(RecruitmentReport {
            schema_version: REPORT_SCHEMA,
            stratification_hash: report.report_hash.clone(),
            plan,
        })
    }
}

/// Result of a full configured run.
#[derive(Debug, Clone)]
pub struct StudyOutcome {
    /// Stratification report.
    pub stratification: StratificationReport,
    /// Recruitment report when the configuration names a sample size.
    pub recruitment: Option<RecruitmentReport>,
}

/// Runs preparation, stratification and, when `sample_size` is configured,
/// recruitment planning.
pub fn run_study(
    table: &PopulationTable,
    config: &StudyConfig,
    sink: &mut dyn EventSink,
) -> Result<StudyOutcome, StrataError> {
    let study = PreparedStudy::build(table, config, sink)?;
    let stratification = study.stratify(config.n_strata, sink)?;
    let recruitment = config
        .sample_size
        .map(|sample_size| study.recruit(&stratification, sample_size, config.rounding))
        .transpose()?;
    Ok(StudyOutcome {
        stratification,
        recruitment,
    })
}
