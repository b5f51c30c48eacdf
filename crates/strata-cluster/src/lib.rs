#![deny(missing_docs)]
#![doc = "Stratification of prepared units by k-means over dissimilarity rows, plus the \
per-stratum summary tables consumed by reporting layers."]

/// Lloyd-style k-means over rows of the dissimilarity matrix.
pub mod kmeans;
/// Per-stratum and population summaries with clipped deviations.
pub mod profile;
/// Small descriptive statistics helpers.
pub mod stats;

use serde::{Deserialize, Serialize};
use strata_core::{ErrorInfo, StrataError, StratumId};

pub use kmeans::stratify;
pub use profile::{
    profile_strata, relative_deviation, Deviation, DeviationCell, GroupProfile, ProfileTables,
    VariableSummary, DEVIATION_BOUND,
};

/// Options controlling the stratifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOpts {
    /// Number of strata to produce.
    pub n_strata: usize,
    /// Maximum number of Lloyd iterations per restart.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Number of independently seeded restarts; the lowest within-SS wins.
    #[serde(default = "default_n_starts")]
    pub n_starts: usize,
    /// Master seed for centroid initialisation.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_max_iterations() -> usize {
    100
}

fn default_n_starts() -> usize {
    1
}

fn default_seed() -> u64 {
    0x5EED_2024
}

impl Default for ClusterOpts {
    fn default() -> Self {
        Self {
            n_strata: 2,
            max_iterations: default_max_iterations(),
            n_starts: default_n_starts(),
            seed: default_seed(),
        }
    }
}

impl ClusterOpts {
    /// Options for `n_strata` strata with default iteration settings.
    pub fn with_strata(n_strata: usize) -> Self {
        Self {
            n_strata,
            ..Self::default()
        }
    }

    /// Checks the options against the number of retained units.
    pub fn validate(&self, n_units: usize) -> Result<(), StrataError> {
        if self.n_strata <= 1 || self.n_strata >= n_units {
            return Err(StrataError::Config(
                ErrorInfo::new(
                    "invalid-n-strata",
                    "n_strata must be greater than 1 and smaller than the population size",
                )
                .with_context("n_strata", self.n_strata)
                .with_context("population", n_units),
            ));
        }
        if self.max_iterations == 0 {
            return Err(StrataError::config(
                "invalid-max-iterations",
                "max_iterations must be at least 1",
            ));
        }
        if self.n_starts == 0 {
            return Err(StrataError::config(
                "invalid-n-starts",
                "n_starts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Final partition of units into strata with clustering diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumAssignment {
    /// Number of strata.
    pub n_strata: usize,
    /// Stratum label per unit, aligned with the prepared table rows.
    pub labels: Vec<StratumId>,
    /// Within-stratum sum of squares in distance-row space.
    pub within_ss: f64,
    /// Total sum of squares around the grand mean.
    pub total_ss: f64,
    /// Between-stratum sum of squares.
    pub between_ss: f64,
    /// `between_ss / total_ss`, the share of variation explained by strata.
    pub variance_explained: f64,
    /// Iterations performed by the winning restart.
    pub iterations: usize,
    /// Whether the winning restart converged before the cap.
    pub converged: bool,
    /// Restart index that produced the partition.
    pub restart: usize,
    /// Within-SS after every iteration of the winning restart.
    pub wss_history: Vec<f64>,
}

impl StratumAssignment {
    /// Stratum labels `1..=k`.
    pub fn strata(&self) -> impl Iterator<Item = StratumId> {
        1..=self.n_strata as StratumId
    }

    /// Row indices of the units assigned to `stratum`, in table order.
    pub fn members(&self, stratum: StratumId) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == stratum)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Unit counts per stratum, indexed by `label - 1`.
    ///
    /// Labels outside `1..=n_strata` are not counted; see
    /// [`StratumAssignment::check_labels`].
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.n_strata];
        for &label in &self.labels {
            if let Some(slot) = (label as usize)
                .checked_sub(1)
                .and_then(|idx| sizes.get_mut(idx))
            {
                *slot += 1;
            }
        }
        sizes
    }

    /// Fails unless every label lies in `1..=n_strata`.
    ///
    /// Assignments can be built or deserialized by callers, so consumers
    /// check before relying on the partition.
    pub fn check_labels(&self) -> Result<(), StrataError> {
        match self
            .labels
            .iter()
            .position(|&label| label == 0 || label as usize > self.n_strata)
        {
            Some(unit) => Err(StrataError::Data(
                ErrorInfo::new("invalid-stratum-label", "stratum label outside 1..=n_strata")
                    .with_context("unit", unit)
                    .with_context("label", self.labels[unit])
                    .with_context("n_strata", self.n_strata),
            )),
            None => Ok(()),
        }
    }
}
