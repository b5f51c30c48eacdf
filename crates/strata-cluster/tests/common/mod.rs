#![allow(dead_code)]

use rand::Rng;
use strata_core::{Cell, PopulationTable, RngHandle, StratifyingVariable};

pub const SCHOOL_VARIABLES: [&str; 4] = ["pct_female", "pct_black", "pct_frlunch", "total"];

/// Synthetic school population with four loosely separated profiles.
pub fn school_population(n: usize, seed: u64) -> PopulationTable {
    let mut rng = RngHandle::from_seed(seed);
    let profiles = [
        (0.48, 0.10, 0.20, 300.0),
        (0.52, 0.60, 0.80, 900.0),
        (0.50, 0.30, 0.50, 1500.0),
        (0.45, 0.05, 0.10, 2400.0),
    ];
    let locales = ["urban", "suburb", "rural", "town"];
    let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(n); 6];
    for i in 0..n {
        let (female, black, frl, total) = profiles[i % profiles.len()];
        columns[0].push(Cell::Number(1000.0 + i as f64));
        columns[1].push(Cell::Number(female + rng.gen_range(-0.03..0.03)));
        columns[2].push(Cell::Number(black + rng.gen_range(-0.05..0.05)));
        columns[3].push(Cell::Number(frl + rng.gen_range(-0.05..0.05)));
        columns[4].push(Cell::Number((total + rng.gen_range(-150.0..150.0_f64)).round()));
        columns[5].push(Cell::Text(locales[i % locales.len()].to_string()));
    }
    let names = ["school_id", "pct_female", "pct_black", "pct_frlunch", "total", "locale"];
    let mut table = PopulationTable::new();
    for (name, cells) in names.iter().zip(columns) {
        table.push_column(*name, cells).expect("synthetic column");
    }
    table
}

pub fn continuous_variables() -> Vec<StratifyingVariable> {
    SCHOOL_VARIABLES
        .iter()
        .map(|name| StratifyingVariable::continuous(*name))
        .collect()
}
