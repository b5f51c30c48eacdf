#![deny(missing_docs)]
#![doc = "Ranks units inside each stratum by typicality and turns a requested sample size \
into per-stratum recruitment targets."]

/// Proportional allocation of a sample across strata.
pub mod allocate;
/// Diagonal-covariance Mahalanobis ranking within strata.
pub mod rank;

pub use allocate::{
    allocate, recruitment_plan, RecruitmentPlan, RoundingPolicy, StratumAllocation,
};
pub use rank::{rank_stratum, rank_units, RankedUnit, RecruitmentList, VARIANCE_EPSILON};
