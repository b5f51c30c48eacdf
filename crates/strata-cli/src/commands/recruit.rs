use std::error::Error;

use clap::{Args as ClapArgs, ValueEnum};
use serde_json::json;
use strata_core::TracingSink;
use strata_recruit::RoundingPolicy;

use super::{emit_json, StudyArgs};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Rounding {
    Independent,
    LargestRemainder,
}

impl From<Rounding> for RoundingPolicy {
    fn from(value: Rounding) -> Self {
        match value {
            Rounding::Independent => RoundingPolicy::Independent,
            Rounding::LargestRemainder => RoundingPolicy::LargestRemainder,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct RecruitArgs {
    #[command(flatten)]
    pub study: StudyArgs,
    /// Override the configured total sample size.
    #[arg(long)]
    pub sample_size: Option<usize>,
    /// Override the configured rounding policy.
    #[arg(long, value_enum)]
    pub rounding: Option<Rounding>,
}

pub fn run(args: &RecruitArgs) -> Result<(), Box<dyn Error>> {
    let (config, study) = args.study.prepare()?;
    let sample_size = args
        .sample_size
        .or(config.sample_size)
        .ok_or("no sample size given: set `sample_size` in the config or pass --sample-size")?;
    let rounding = args.rounding.map(RoundingPolicy::from).unwrap_or(config.rounding);

    let stratification = study.stratify(config.n_strata, &mut TracingSink)?;
    let recruitment = study.recruit(&stratification, sample_size, rounding)?;
    let output = json!({
        "stratification": stratification,
        "recruitment": recruitment,
        "initial_contacts": recruitment
            .plan
            .initial_contacts()
            .into_iter()
            .map(|(stratum, units)| json!({ "stratum": stratum, "units": units }))
            .collect::<Vec<_>>(),
    });
    emit_json(args.study.out.as_deref(), &output)
}
