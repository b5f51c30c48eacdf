use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args as ClapArgs;
use serde_json::Value;
use strata_core::TracingSink;
use strata_run::{load_config, to_canonical_json_pretty, PreparedStudy, StudyConfig};

use crate::ingest::read_population;

pub mod index;
pub mod recruit;
pub mod stratify;

/// Inputs shared by the stratify and recruit commands.
#[derive(ClapArgs, Debug)]
pub struct StudyArgs {
    /// Population table in CSV form with a header row.
    #[arg(long)]
    pub population: PathBuf,
    /// YAML study configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Override the configured number of strata.
    #[arg(long)]
    pub n_strata: Option<usize>,
    /// Write JSON here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl StudyArgs {
    pub(crate) fn prepare(&self) -> Result<(StudyConfig, PreparedStudy), Box<dyn Error>> {
        let mut config = load_config(&self.config)?;
        if let Some(n_strata) = self.n_strata {
            config.n_strata = n_strata;
        }
        let table = read_population(&self.population)?;
        let study = PreparedStudy::build(&table, &config, &mut TracingSink)?;
        Ok((config, study))
    }
}

pub(crate) fn emit_json(out: Option<&Path>, value: &Value) -> Result<(), Box<dyn Error>> {
    let mut text = to_canonical_json_pretty(value)?;
    text.push('\n');
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{text}"),
    }
    Ok(())
}
