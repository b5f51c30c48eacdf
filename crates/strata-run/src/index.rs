use serde::{Deserialize, Serialize};
use strata_core::{ErrorInfo, StrataError};

/// Scores how closely a sample resembles its population.
///
/// Implementations receive per-unit probabilities (typically propensity
/// scores) and return a similarity in `[0, 1]`, where 1 means identical
/// distributions.
pub trait SimilarityScorer {
    /// Compares `sample` against `population`.
    fn score(&self, sample: &[f64], population: &[f64]) -> Result<f64, StrataError>;
}

/// Bhattacharyya coefficient over equal-width bins on `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BhattacharyyaIndex {
    /// Number of bins.
    pub bins: usize,
}

impl Default for BhattacharyyaIndex {
    fn default() -> Self {
        Self { bins: 10 }
    }
}

impl BhattacharyyaIndex {
    /// Index with `bins` equal-width bins.
    pub fn with_bins(bins: usize) -> Self {
        Self { bins }
    }

    fn histogram(&self, label: &str, values: &[f64]) -> Result<Vec<f64>, StrataError> {
        if values.is_empty() {
            return Err(StrataError::Data(
                ErrorInfo::new("empty-scores", "score vector is empty").with_context("side", label),
            ));
        }
        let mut counts = vec![0usize; self.bins];
        for (position, &value) in values.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(StrataError::Data(
                    ErrorInfo::new("score-out-of-range", "scores must be probabilities in [0, 1]")
                        .with_context("side", label)
                        .with_context("position", position)
                        .with_context("value", value),
                ));
            }
            // 1.0 lands in the last bin.
            let bin = ((value * self.bins as f64) as usize).min(self.bins - 1);
            counts[bin] += 1;
        }
        let total = values.len() as f64;
        Ok(counts.into_iter().map(|count| count as f64 / total).collect())
    }
}

impl SimilarityScorer for BhattacharyyaIndex {
    fn score(&self, sample: &[f64], population: &[f64]) -> Result<f64, StrataError> {
        if self.bins == 0 {
            return Err(StrataError::config(
                "invalid-bins",
                "the index needs at least one bin",
            ));
        }
        let sample = self.histogram("sample", sample)?;
        let population = self.histogram("population", population)?;
        let coefficient: f64 = sample
            .iter()
            .zip(&population)
            .map(|(p, q)| (p * q).sqrt())
            .sum();
        Ok(coefficient.clamp(0.0, 1.0))
    }
}
