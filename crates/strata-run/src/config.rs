use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_cluster::ClusterOpts;
use strata_core::{
    ErrorInfo, PopulationTable, StrataError, StratifyingVariable, VariableKind,
};
use strata_recruit::RoundingPolicy;

use crate::hash::stable_hash_string;
use crate::serde::{from_yaml_slice, to_yaml_string};

fn config_error(code: &str, message: impl Into<String>) -> StrataError {
    StrataError::config(code, message)
}

/// Stratifying variable as written in a configuration file.
///
/// Either a bare column name (kind inferred from the data) or a mapping with
/// an explicit `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableEntry {
    /// Column name only.
    Name(String),
    /// Column name with an explicit measurement kind.
    Typed {
        /// Column name.
        name: String,
        /// Measurement kind.
        kind: VariableKind,
    },
}

impl VariableEntry {
    /// Column name referenced by the entry.
    pub fn name(&self) -> &str {
        match self {
            VariableEntry::Name(name) | VariableEntry::Typed { name, .. } => name,
        }
    }
}

/// K-means tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Iteration cap per restart.
    #[serde(default = "ClusteringConfig::default_max_iterations")]
    pub max_iterations: usize,
    /// Number of seeded restarts.
    #[serde(default = "ClusteringConfig::default_n_starts")]
    pub n_starts: usize,
    /// Master seed.
    #[serde(default = "ClusteringConfig::default_seed")]
    pub seed: u64,
}

impl ClusteringConfig {
    fn default_max_iterations() -> usize {
        ClusterOpts::default().max_iterations
    }

    fn default_n_starts() -> usize {
        ClusterOpts::default().n_starts
    }

    fn default_seed() -> u64 {
        ClusterOpts::default().seed
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_iterations: Self::default_max_iterations(),
            n_starts: Self::default_n_starts(),
            seed: Self::default_seed(),
        }
    }
}

/// Immutable configuration bundle for one study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Column holding unit identifiers.
    pub id_column: String,
    /// Stratifying variables.
    pub variables: Vec<VariableEntry>,
    /// Number of strata.
    pub n_strata: usize,
    /// Desired total sample size, if a recruitment plan is wanted.
    #[serde(default)]
    pub sample_size: Option<usize>,
    /// Clustering knobs.
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// Target rounding policy.
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

impl StudyConfig {
    /// Configuration with default clustering and rounding settings.
    pub fn new(
        id_column: impl Into<String>,
        variables: Vec<VariableEntry>,
        n_strata: usize,
    ) -> Self {
        Self {
            id_column: id_column.into(),
            variables,
            n_strata,
            sample_size: None,
            clustering: ClusteringConfig::default(),
            rounding: RoundingPolicy::default(),
        }
    }

    /// Clustering options for `n_strata` strata.
    pub fn cluster_opts(&self, n_strata: usize) -> ClusterOpts {
        ClusterOpts {
            n_strata,
            max_iterations: self.clustering.max_iterations,
            n_starts: self.clustering.n_starts,
            seed: self.clustering.seed,
        }
    }

    /// Deterministic hash of the configuration contents.
    pub fn config_hash(&self) -> Result<String, StrataError> {
        stable_hash_string(self)
    }

    /// Canonical YAML rendering.
    pub fn to_yaml_string(&self) -> Result<String, StrataError> {
        to_yaml_string(self)
    }

    /// Checks every scalar parameter against the table before numeric work.
    pub fn validate(&self, table: &PopulationTable) -> Result<(), StrataError> {
        if table.column(&self.id_column).is_none() {
            return Err(StrataError::Config(
                ErrorInfo::new("unknown-id-column", "identifier column not found in table")
                    .with_context("column", &self.id_column),
            ));
        }
        if self.variables.is_empty() {
            return Err(config_error(
                "no-variables",
                "at least one stratifying variable is required",
            ));
        }
        let mut seen = BTreeSet::new();
        for spec in &self.variables {
            let name = spec.name();
            if name == self.id_column {
                return Err(StrataError::Config(
                    ErrorInfo::new(
                        "id-as-variable",
                        "the identifier column cannot be a stratifying variable",
                    )
                    .with_context("variable", name),
                ));
            }
            if table.column(name).is_none() {
                return Err(StrataError::Config(
                    ErrorInfo::new("unknown-variable", "stratifying variable not found in table")
                        .with_context("variable", name)
                        .with_hint("check the spelling against the table header"),
                ));
            }
            if !seen.insert(name) {
                return Err(StrataError::Config(
                    ErrorInfo::new(
                        "duplicate-variable",
                        "stratifying variable listed more than once",
                    )
                    .with_context("variable", name),
                ));
            }
        }
        self.cluster_opts(self.n_strata).validate(table.n_rows())?;
        if let Some(sample_size) = self.sample_size {
            if sample_size == 0 || sample_size >= table.n_rows() {
                return Err(StrataError::Config(
                    ErrorInfo::new(
                        "invalid-sample-size",
                        "sample size must be positive and smaller than the population size",
                    )
                    .with_context("sample_size", sample_size)
                    .with_context("population", table.n_rows()),
                ));
            }
        }
        Ok(())
    }

    /// Resolves variable kinds, inferring them from the table when omitted.
    pub fn resolve_variables(
        &self,
        table: &PopulationTable,
    ) -> Result<Vec<StratifyingVariable>, StrataError> {
        self.variables
            .iter()
            .map(|spec| {
                let column = table.column(spec.name()).ok_or_else(|| {
                    StrataError::Config(
                        ErrorInfo::new("unknown-variable", "stratifying variable not found in table")
                            .with_context("variable", spec.name()),
                    )
                })?;
                let kind = match spec {
                    VariableEntry::Typed { kind, .. } => *kind,
                    VariableEntry::Name(_) => column.infer_kind(),
                };
                Ok(StratifyingVariable {
                    name: spec.name().to_string(),
                    kind,
                })
            })
            .collect()
    }
}

/// Loads a study configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StudyConfig, StrataError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        StrataError::Serde(
            ErrorInfo::new("config_read", err.to_string())
                .with_context("path", path.display()),
        )
    })?;
    parse_bytes(&bytes)
}

/// Parses a study configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<StudyConfig, StrataError> {
    parse_bytes(yaml.as_bytes())
}

fn parse_bytes(bytes: &[u8]) -> Result<StudyConfig, StrataError> {
    from_yaml_slice(bytes).map_err(|err| {
        StrataError::Config(
            err.info()
                .clone()
                .with_hint("n_strata and sample_size must be positive integers"),
        )
    })
}
