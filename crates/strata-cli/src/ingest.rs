use std::error::Error;
use std::fs;
use std::path::Path;

use strata_core::{Cell, PopulationTable};

/// Reads a headed CSV file into a population table.
pub fn read_population(path: &Path) -> Result<PopulationTable, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), "population loaded");
    Ok(PopulationTable::from_rows(&header, rows)?)
}

/// Reads a probability vector: a JSON array, or numbers separated by
/// commas and/or whitespace.
pub fn read_scores(path: &Path) -> Result<Vec<f64>, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&text)?);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut scores = Vec::new();
    for record in reader.records() {
        for field in record?.iter() {
            for token in field.split_whitespace() {
                scores.push(token.parse::<f64>().map_err(|err| {
                    format!("{}: invalid score `{token}`: {err}", path.display())
                })?);
            }
        }
    }
    Ok(scores)
}
