mod common;

use std::io::Write;

use common::school_population;
use strata_core::{NullSink, StrataError, VariableKind};
use strata_recruit::RoundingPolicy;
use strata_run::{load_config, parse_config, PreparedStudy, StudyConfig, VariableEntry};

const CONFIG: &str = r#"
id_column: school_id
variables:
  - pct_female
  - pct_black
  - name: total
    kind: continuous
  - locale
n_strata: 4
sample_size: 40
clustering:
  n_starts: 3
  seed: 17
rounding: largest_remainder
"#;

fn names(names: &[&str]) -> Vec<VariableEntry> {
    names.iter().map(|name| VariableEntry::Name(name.to_string())).collect()
}

#[test]
fn yaml_config_fills_defaults() -> Result<(), StrataError> {
    let config = parse_config(CONFIG)?;
    assert_eq!(config.id_column, "school_id");
    assert_eq!(config.variables.len(), 4);
    assert_eq!(config.sample_size, Some(40));
    assert_eq!(config.clustering.max_iterations, 100);
    assert_eq!(config.clustering.n_starts, 3);
    assert_eq!(config.clustering.seed, 17);
    assert_eq!(config.rounding, RoundingPolicy::LargestRemainder);
    Ok(())
}

#[test]
fn config_loads_from_disk_and_hashes_stably() -> Result<(), StrataError> {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CONFIG.as_bytes()).expect("write config");
    let loaded = load_config(file.path())?;
    assert_eq!(loaded, parse_config(CONFIG)?);

    let reparsed = parse_config(&loaded.to_yaml_string()?)?;
    assert_eq!(reparsed.config_hash()?, loaded.config_hash()?);
    Ok(())
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.yaml");
    let err = load_config(&path).unwrap_err();
    assert_eq!(err.info().code, "config_read");
    assert!(err.info().context.contains_key("path"));
}

#[test]
fn non_numeric_stratum_count_is_a_config_error() {
    let err = parse_config("id_column: school_id\nvariables: [total]\nn_strata: four\n")
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn kinds_are_inferred_when_omitted() -> Result<(), StrataError> {
    let table = school_population(40, 1);
    let config = parse_config(CONFIG)?;
    let resolved = config.resolve_variables(&table)?;
    let kinds: Vec<VariableKind> = resolved.iter().map(|v| v.kind).collect();
    assert_eq!(
        kinds,
        vec![
            VariableKind::Continuous,
            VariableKind::Continuous,
            VariableKind::Continuous,
            VariableKind::Categorical,
        ]
    );
    Ok(())
}

#[test]
fn invalid_parameters_fail_before_numeric_work() {
    let table = school_population(20, 2);
    let cases: Vec<(StudyConfig, &str)> = vec![
        (
            StudyConfig::new("school_id", names(&["total"]), 1),
            "invalid-n-strata",
        ),
        (
            StudyConfig::new("school_id", names(&["total"]), 21),
            "invalid-n-strata",
        ),
        (
            StudyConfig::new("school_id", names(&["enrolment"]), 3),
            "unknown-variable",
        ),
        (StudyConfig::new("school_id", Vec::new(), 3), "no-variables"),
        (
            StudyConfig::new("district", names(&["total"]), 3),
            "unknown-id-column",
        ),
        (
            StudyConfig::new("school_id", names(&["total", "total"]), 3),
            "duplicate-variable",
        ),
    ];
    for (config, code) in cases {
        let err = PreparedStudy::build(&table, &config, &mut NullSink).unwrap_err();
        assert!(err.is_config(), "{code}: {err}");
        assert_eq!(err.info().code, code);
    }

    let mut oversized = StudyConfig::new("school_id", names(&["total"]), 3);
    oversized.sample_size = Some(20);
    let err = oversized.validate(&table).unwrap_err();
    assert_eq!(err.info().code, "invalid-sample-size");
}
