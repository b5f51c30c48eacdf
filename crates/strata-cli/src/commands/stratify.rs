use std::error::Error;

use strata_core::TracingSink;

use super::{emit_json, StudyArgs};

pub fn run(args: &StudyArgs) -> Result<(), Box<dyn Error>> {
    let (config, study) = args.prepare()?;
    let report = study.stratify(config.n_strata, &mut TracingSink)?;
    tracing::info!(
        strata = report.n_strata(),
        variance_explained = report.variance_explained(),
        "stratification finished"
    );
    emit_json(args.out.as_deref(), &serde_json::to_value(&report)?)
}
