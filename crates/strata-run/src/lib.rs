//! Configuration, end-to-end pipeline and reports for stratified
//! recruitment studies.
//!
//! A [`PreparedStudy`] holds the prepared table and dissimilarity matrix so
//! several stratum counts can be compared before a recruitment plan is
//! drawn from the chosen stratification.
#![deny(missing_docs)]

mod config;
mod hash;
mod index;
mod pipeline;
mod report;
mod serde;

pub use crate::config::{
    load_config, parse_config, ClusteringConfig, StudyConfig, VariableEntry,
};
pub use crate::hash::stable_hash_string;
pub use crate::index::{BhattacharyyaIndex, SimilarityScorer};
pub use crate::pipeline::{run_study, PreparedStudy, StudyOutcome, REPORT_SCHEMA};
pub use crate::report::{RecruitmentReport, StratificationReport, UnitStratum};
pub use crate::serde::{
    from_json_slice, from_yaml_slice, to_canonical_json_bytes, to_canonical_json_pretty,
    to_yaml_string,
};
