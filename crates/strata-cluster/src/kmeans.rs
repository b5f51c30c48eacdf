
use rand::seq::index;
use strata_core::{ErrorInfo, EventSink, PipelineEvent, RngHandle, StrataError, StratumId};
use strata_prep::DistanceMatrix;

use crate::{ClusterOpts, StratumAssignment};

const UNASSIGNED: usize = usize::MAX;

struct LloydRun {
    restart: usize,
    assignments: Vec<usize>,
    within_ss: f64,
    iterations: usize,
    converged: bool,
    history: Vec<f64>,
}

/// Partitions the units behind `distances` into `opts.n_strata` strata.
///
/// Each unit is represented by its row of the dissimilarity matrix and the rows
/// are clustered with Lloyd iterations under Euclidean distance. Every
/// iteration reports the within-cluster sum of squares to `sink`; a restart
/// stops when assignments no longer change or at `opts.max_iterations`.
/// Hitting the cap is not an error.
pub fn stratify(
    distances: &DistanceMatrix,
    opts: &ClusterOpts,
    sink: &mut dyn EventSink,
) -> Result<StratumAssignment, StrataError> {
    let n = distances.len();
    opts.validate(n)?;
    let features: Vec<&[f64]> = distances.rows().collect();
    let distinct = count_distinct(&features, opts.n_strata);
    if distinct < opts.n_strata {
        return Err(StrataError::Data(
            ErrorInfo::new(
                "too-few-distinct-units",
                "population has fewer distinct units than requested strata",
            )
            .with_context("distinct", distinct)
            .with_context("n_strata", opts.n_strata),
        ));
    }

    let total_ss = total_sum_of_squares(&features);
    let mut best: Option<LloydRun> = None;
    for restart in 0..opts.n_starts {
        let run = run_lloyd(&features, opts, restart, sink);
        sink.emit(PipelineEvent::ClusteringFinished {
            restart,
            iterations: run.iterations,
            converged: run.converged,
            within_ss: run.within_ss,
        });
        let better = best
            .as_ref()
            .map_or(true, |current| run.within_ss < current.within_ss);
        if better {
            best = Some(run);
        }
    }
    let best = best.ok_or_else(|| StrataError::config("invalid-n-starts", "no restart ran"))?;
    if !best.converged {
        tracing::warn!(
            iterations = best.iterations,
            "stratifier reached the iteration cap before converging"
        );
    }

    let between_ss = (total_ss - best.within_ss).max(0.0);
    let variance_explained = if total_ss > 0.0 {
        (between_ss / total_ss).clamp(0.0, 1.0)
    } else {
        0.0
    };
    sink.emit(PipelineEvent::VarianceExplained {
        ratio: variance_explained,
    });
    tracing::info!(
        n_strata = opts.n_strata,
        restart = best.restart,
        variance_explained,
        "stratification finished"
    );

    let labels: Vec<StratumId> = best
        .assignments
        .iter()
        .map(|&cluster| cluster as StratumId + 1)
        .collect();
    Ok(StratumAssignment {
        n_strata: opts.n_strata,
        labels,
        within_ss: best.within_ss,
        total_ss,
        between_ss,
        variance_explained,
        iterations: best.iterations,
        converged: best.converged,
        restart: best.restart,
        wss_history: best.history,
    })
}

/// Number of distinct rows, counting no further than `limit`.
///
/// Identical rows `i` and `r` have `d(i, r) == d(r, r) == 0`, so the full
/// comparison only runs against representatives at distance zero.
fn count_distinct(features: &[&[f64]], limit: usize) -> usize {
    let mut representatives: Vec<usize> = Vec::with_capacity(limit);
    for (unit, row) in features.iter().enumerate() {
        if representatives.len() >= limit {
            break;
        }
        let duplicate = representatives
            .iter()
            .any(|&rep| row[rep] == 0.0 && *row == features[rep]);
        if !duplicate {
            representatives.push(unit);
        }
    }
    representatives.len()
}

fn run_lloyd(
    features: &[&[f64]],
    opts: &ClusterOpts,
    restart: usize,
    sink: &mut dyn EventSink,
) -> LloydRun {
    let k = opts.n_strata;
    let mut centroids = initialise_centroids(features, k, opts.seed, restart as u64);
    let mut assignments = vec![UNASSIGNED; features.len()];
    let mut history = Vec::new();
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 1..=opts.max_iterations {
        iterations = iteration;
        let mut changed = assign_clusters(features, &centroids, &mut assignments);
        changed |= repair_empty_clusters(features, &mut centroids, &mut assignments, k);
        recompute_centroids(features, &assignments, &mut centroids);
        let within_ss = within_sum_of_squares(features, &centroids, &assignments);
        history.push(within_ss);
        sink.emit(PipelineEvent::ClusteringIteration {
            restart,
            iteration,
            within_ss,
        });
        if !changed {
            converged = true;
            break;
        }
    }

    LloydRun {
        restart,
        within_ss: history.last().copied().unwrap_or(0.0),
        assignments,
        iterations,
        converged,
        history,
    }
}

fn initialise_centroids(
    features: &[&[f64]],
    k: usize,
    seed: u64,
    restart: u64,
) -> Vec<Vec<f64>> {
    let mut rng = RngHandle::substream(seed, restart);
    index::sample(rng.inner_mut(), features.len(), k)
        .into_iter()
        .map(|idx| features[idx].to_vec())
        .collect()
}

fn assign_clusters(
    features: &[&[f64]],
    centroids: &[Vec<f64>],
    assignments: &mut [usize],
) -> bool {
    let mut changed = false;
    for (idx, feature) in features.iter().enumerate() {
        let current = assignments[idx];
        let (mut best, mut best_dist) = if current == UNASSIGNED {
            (0, f64::INFINITY)
        } else {
            (current, squared_distance(feature, &centroids[current]))
        };
        for (cluster_idx, centroid) in centroids.iter().enumerate() {
            let dist = squared_distance(feature, centroid);
            if dist < best_dist {
                best = cluster_idx;
                best_dist = dist;
            }
        }
        if current != best {
            assignments[idx] = best;
            changed = true;
        }
    }
    changed
}

/// Moves the unit farthest from its centroid into each empty cluster.
fn repair_empty_clusters(
    features: &[&[f64]],
    centroids: &mut [Vec<f64>],
    assignments: &mut [usize],
    k: usize,
) -> bool {
    let mut counts = vec![0usize; k];
    for &cluster in assignments.iter() {
        counts[cluster] += 1;
    }
    let mut repaired = false;
    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let candidate = features
            .iter()
            .enumerate()
            .filter(|(idx, _)| counts[assignments[*idx]] > 1)
            .map(|(idx, feature)| {
                let dist = squared_distance(feature, &centroids[assignments[idx]]);
                (idx, dist)
            })
            .filter(|(_, dist)| *dist > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (idx, dist)| match best {
                Some((_, best_dist)) if best_dist >= dist => best,
                _ => Some((idx, dist)),
            });
        if let Some((unit, _)) = candidate {
            counts[assignments[unit]] -= 1;
            counts[empty] = 1;
            assignments[unit] = empty;
            centroids[empty] = features[unit].to_vec();
            repaired = true;
            tracing::debug!(cluster = empty, unit, "reseeded empty cluster");
        }
    }
    repaired
}

fn recompute_centroids(features: &[&[f64]], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = features.first().map_or(0, |row| row.len());
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (feature, &cluster) in features.iter().zip(assignments) {
        counts[cluster] += 1;
        for (slot, value) in sums[cluster].iter_mut().zip(feature.iter()) {
            *slot += value;
        }
    }
    for (cluster, sum) in sums.into_iter().enumerate() {
        if counts[cluster] == 0 {
            continue;
        }
        let denom = counts[cluster] as f64;
        centroids[cluster] = sum.into_iter().map(|value| value / denom).collect();
    }
}

fn within_sum_of_squares(
    features: &[&[f64]],
    centroids: &[Vec<f64>],
    assignments: &[usize],
) -> f64 {
    features
        .iter()
        .zip(assignments)
        .map(|(feature, &cluster)| squared_distance(feature, &centroids[cluster]))
        .sum()
}

fn total_sum_of_squares(features: &[&[f64]]) -> f64 {
    let dim = features.first().map_or(0, |row| row.len());
    let mut grand = vec![0.0; dim];
    for feature in features {
        for (slot, value) in grand.iter_mut().zip(feature.iter()) {
            *slot += value;
        }
    }
    let denom = features.len().max(1) as f64;
    for value in &mut grand {
        *value /= denom;
    }
    features
        .iter()
        .map(|feature| squared_distance(feature, &grand))
        .sum()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
