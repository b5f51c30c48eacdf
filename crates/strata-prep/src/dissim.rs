use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::hash::fingerprint_distances;
use crate::prepare::{ColumnKind, PreparedTable};

/// Square, symmetric dissimilarity matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Number of units (rows and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix covers no units.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Dissimilarity between units `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Distances from unit `i` to every unit, used as its feature vector.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Iterates over all rows in unit order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks(self.n.max(1))
    }

    /// SHA-256 fingerprint over the value bit patterns.
    pub fn fingerprint(&self) -> String {
        fingerprint_distances(self.n, &self.values)
    }
}

struct ColumnScale {
    kind: ColumnKind,
    range: f64,
}

fn column_scales(prepared: &PreparedTable) -> Vec<ColumnScale> {
    prepared
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let (min, max) = prepared
                .column_values(idx)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            ColumnScale {
                kind: column.kind,
                range: max - min,
            }
        })
        .collect()
}

fn contribution(scale: &ColumnScale, a: f64, b: f64) -> f64 {
    match scale.kind {
        ColumnKind::Indicator => {
            if a == b {
                0.0
            } else {
                1.0
            }
        }
        ColumnKind::Continuous if scale.range > 0.0 => (a - b).abs() / scale.range,
        ColumnKind::Continuous => 0.0,
    }
}

/// Computes the Gower-style mixed-type dissimilarity between every pair of
/// prepared units.
///
/// Continuous columns contribute their range-normalised absolute difference,
/// indicator columns a mismatch flag, and the pair distance is the mean of the
/// contributions. Constant columns contribute zero but still count in the mean.
/// Rows are computed in parallel; every cell depends only on its own pair so the
/// result is identical to a sequential pass.
pub fn compute_dissimilarity(prepared: &PreparedTable) -> DistanceMatrix {
    let n = prepared.n_units();
    let scales = column_scales(prepared);
    let width = scales.len().max(1) as f64;
    let mut values = vec![0.0; n * n];
    values
        .par_chunks_mut(n.max(1))
        .enumerate()
        .for_each(|(i, out)| {
            let row_i = prepared.row(i);
            for (j, slot) in out.iter_mut().enumerate() {
                if i == j {
                    continue;
                }
                let row_j = prepared.row(j);
                let total: f64 = scales
                    .iter()
                    .zip(row_i.iter().zip(row_j))
                    .map(|(scale, (&a, &b))| contribution(scale, a, b))
                    .sum();
                *slot = total / width;
            }
        });
    tracing::debug!(units = n, "computed dissimilarity matrix");
    DistanceMatrix { n, values }
}
