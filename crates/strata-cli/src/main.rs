use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    index::{self, IndexArgs},
    recruit::{self, RecruitArgs},
    stratify, StudyArgs,
};
use tracing_subscriber::EnvFilter;

mod commands;
mod ingest;

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Stratified recruitment planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition a population into strata and print the stratification report.
    Stratify(StudyArgs),
    /// Stratify, then allocate a sample and rank units within each stratum.
    Recruit(RecruitArgs),
    /// Score the similarity of two probability vectors.
    Index(IndexArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Stratify(args) => stratify::run(&args),
        Command::Recruit(args) => recruit::run(&args),
        Command::Index(args) => index::run(&args),
    }
}
