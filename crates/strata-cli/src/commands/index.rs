use std::error::Error;
use std::path::PathBuf;

use clap::Args as ClapArgs;
use serde_json::json;
use strata_run::{BhattacharyyaIndex, SimilarityScorer};

use super::emit_json;
use crate::ingest::read_scores;

#[derive(ClapArgs, Debug)]
pub struct IndexArgs {
    /// Probabilities for the recruited sample.
    #[arg(long)]
    pub sample: PathBuf,
    /// Probabilities for the target population.
    #[arg(long)]
    pub population: PathBuf,
    /// Number of equal-width bins on [0, 1].
    #[arg(long, default_value_t = 10)]
    pub bins: usize,
}

pub fn run(args: &IndexArgs) -> Result<(), Box<dyn Error>> {
    let sample = read_scores(&args.sample)?;
    let population = read_scores(&args.population)?;
    let index = BhattacharyyaIndex::with_bins(args.bins);
    let score = index.score(&sample, &population)?;
    emit_json(
        None,
        &json!({
            "index": "bhattacharyya",
            "bins": args.bins,
            "sample_size": sample.len(),
            "population_size": population.len(),
            "score": score,
        }),
    )
}
