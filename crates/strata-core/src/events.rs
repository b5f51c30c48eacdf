//! Progress events emitted while the pipeline runs.

use serde::{Deserialize, Serialize};

/// Structured progress event; consumers may ignore every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Variable preparation finished.
    TablePrepared {
        /// Units kept after complete-case filtering.
        retained: usize,
        /// Units dropped because of missing values.
        dropped: usize,
        /// Numeric columns after indicator expansion.
        columns: usize,
    },
    /// The pairwise dissimilarity matrix is available.
    DistanceMatrixComputed {
        /// Number of units covered by the matrix.
        units: usize,
    },
    /// One Lloyd iteration of the stratifier completed.
    ClusteringIteration {
        /// Restart index (0-based).
        restart: usize,
        /// Iteration index (1-based) within the restart.
        iteration: usize,
        /// Within-cluster sum of squares after the centroid update.
        within_ss: f64,
    },
    /// A restart of the stratifier finished.
    ClusteringFinished {
        /// Restart index (0-based).
        restart: usize,
        /// Iterations performed.
        iterations: usize,
        /// Whether assignments stabilised before the iteration cap.
        converged: bool,
        /// Final within-cluster sum of squares.
        within_ss: f64,
    },
    /// Final between/total sum of squares ratio of the retained partition.
    VarianceExplained {
        /// Ratio in [0, 1].
        ratio: f64,
    },
}

/// Receiver for [`PipelineEvent`]s.
pub trait EventSink {
    /// Accepts a single event.
    fn emit(&mut self, event: PipelineEvent);
}

impl EventSink for Vec<PipelineEvent> {
    fn emit(&mut self, event: PipelineEvent) {
        self.push(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: PipelineEvent) {}
}

/// Sink forwarding events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: PipelineEvent) {
        match &event {
            PipelineEvent::ClusteringIteration {
                restart,
                iteration,
                within_ss,
            } => tracing::debug!(restart, iteration, within_ss, "stratifier iteration"),
            PipelineEvent::VarianceExplained { ratio } => {
                tracing::info!(ratio, "variation explained by strata")
            }
            other => tracing::debug!(event = ?other, "pipeline progress"),
        }
    }
}
