use serde::{Deserialize, Serialize};
use strata_cluster::StratumAssignment;
use strata_core::{ErrorInfo, StrataError, StratumId, UnitId};
use strata_prep::PreparedTable;

use crate::rank::{rank_units, RecruitmentList};

/// How per-stratum targets are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Each stratum rounds `N * proportion` on its own; totals may drift from `N`.
    #[default]
    Independent,
    /// Largest-remainder apportionment; targets sum exactly to `N`.
    LargestRemainder,
}

/// Allocation row for one stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumAllocation {
    /// Stratum label.
    pub stratum: StratumId,
    /// Units of the stratum in the population.
    pub population_count: usize,
    /// Share of the population, rounded to three decimals.
    pub proportion: f64,
    /// Number of units to recruit from the stratum.
    pub target_count: usize,
}

/// Recruitment plan: allocation table plus ranked lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentPlan {
    /// Requested total sample size.
    pub sample_size: usize,
    /// Retained population size.
    pub population_size: usize,
    /// Rounding policy used for the targets.
    pub rounding: RoundingPolicy,
    /// Allocation per stratum ordered by label.
    pub allocations: Vec<StratumAllocation>,
    /// Ranked recruitment list per stratum ordered by label.
    pub lists: Vec<RecruitmentList>,
}

impl RecruitmentPlan {
    /// Sum of per-stratum targets.
    pub fn total_target(&self) -> usize {
        self.allocations.iter().map(|a| a.target_count).sum()
    }

    /// Ranked list for one stratum.
    pub fn list(&self, stratum: StratumId) -> Option<&RecruitmentList> {
        self.lists.iter().find(|list| list.stratum == stratum)
    }

    /// First `target_count` units of each stratum: whom to approach first.
    ///
    /// Remaining units of each list, in rank order, are the replacements.
    pub fn initial_contacts(&self) -> Vec<(StratumId, Vec<UnitId>)> {
        self.allocations
            .iter()
            .map(|allocation| {
                let ids = self
                    .list(allocation.stratum)
                    .map(|list| {
                        list.unit_ids()
                            .take(allocation.target_count)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                (allocation.stratum, ids)
            })
            .collect()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Splits `sample_size` across strata in proportion to their size.
pub fn allocate(
    assignment: &StratumAssignment,
    sample_size: usize,
    rounding: RoundingPolicy,
) -> Result<Vec<StratumAllocation>, StrataError> {
    let population_size = assignment.labels.len();
    if sample_size == 0 || sample_size >= population_size {
        return Err(StrataError::Config(
            ErrorInfo::new(
                "invalid-sample-size",
                "sample size must be positive and smaller than the population size",
            )
            .with_context("sample_size", sample_size)
            .with_context("population", population_size),
        ));
    }
    assignment.check_labels()?;
    let sizes = assignment.sizes();
    let exact: Vec<f64> = sizes
        .iter()
        .map(|&size| sample_size as f64 * size as f64 / population_size as f64)
        .collect();
    let targets: Vec<usize> = match rounding {
        RoundingPolicy::Independent => exact.iter().map(|value| value.round() as usize).collect(),
        RoundingPolicy::LargestRemainder => largest_remainder(&exact, sample_size),
    };

    let allocations: Vec<StratumAllocation> = assignment
        .strata()
        .zip(sizes.iter().zip(targets))
        .map(|(stratum, (&size, target_count))| StratumAllocation {
            stratum,
            population_count: size,
            proportion: round3(size as f64 / population_size as f64),
            target_count,
        })
        .collect();
    let total: usize = allocations.iter().map(|a| a.target_count).sum();
    if total != sample_size {
        tracing::info!(
            requested = sample_size,
            allocated = total,
            rounding = ?rounding,
            "rounded targets do not sum to the requested sample size"
        );
    }
    Ok(allocations)
}

fn largest_remainder(exact: &[f64], sample_size: usize) -> Vec<usize> {
    let mut targets: Vec<usize> = exact.iter().map(|value| value.floor() as usize).collect();
    let assigned: usize = targets.iter().sum();
    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &idx in order.iter().take(sample_size.saturating_sub(assigned)) {
        targets[idx] += 1;
    }
    targets
}

/// Allocates `sample_size` and attaches the ranked list of every stratum.
pub fn recruitment_plan(
    prepared: &PreparedTable,
    assignment: &StratumAssignment,
    sample_size: usize,
    rounding: RoundingPolicy,
) -> Result<RecruitmentPlan, StrataError> {
    let allocations = allocate(assignment, sample_size, rounding)?;
    let lists = rank_units(prepared, assignment)?;
    Ok(RecruitmentPlan {
        sample_size,
        population_size: assignment.labels.len(),
        rounding,
        allocations,
        lists,
    })
}
