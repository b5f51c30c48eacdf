#![deny(missing_docs)]
#![doc = "Variable preparation (indicator expansion, complete-case filtering) and the \
Gower-style dissimilarity matrix used by the stratifier."]

/// Mixed-type pairwise dissimilarity computation.
pub mod dissim;
/// Content fingerprints for prepared artefacts.
pub mod hash;
/// Selection, indicator expansion and complete-case filtering.
pub mod prepare;

pub use dissim::{compute_dissimilarity, DistanceMatrix};
pub use prepare::{prepare_table, ColumnKind, PreparedColumn, PreparedTable};
