mod common;

use strata_core::{Cell, PopulationTable, StrataError, StratifyingVariable, UnitId};
use strata_prep::{compute_dissimilarity, prepare_table, ColumnKind};

fn small_table() -> Result<PopulationTable, StrataError> {
    PopulationTable::new()
        .with_column(
            "id",
            vec![
                Cell::Number(1.0),
                Cell::Number(2.0),
                Cell::Number(3.0),
                Cell::Number(4.0),
            ],
        )?
        .with_column(
            "enrolment",
            vec![
                Cell::Number(120.0),
                Cell::Missing,
                Cell::Number(340.0),
                Cell::Number(90.0),
            ],
        )?
        .with_column(
            "locale",
            vec![
                Cell::Text("urban".to_string()),
                Cell::Text("rural".to_string()),
                Cell::Text("town".to_string()),
                Cell::Text("rural".to_string()),
            ],
        )
}

#[test]
fn categorical_expands_to_levels_minus_one() -> Result<(), StrataError> {
    let table = small_table()?;
    let variables = vec![
        StratifyingVariable::continuous("enrolment"),
        StratifyingVariable::categorical("locale"),
    ];
    let prepared = prepare_table(&table, "id", &variables)?;

    let names: Vec<&str> = prepared.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["enrolment", "locale_town", "locale_urban"]);
    assert_eq!(prepared.columns()[1].kind, ColumnKind::Indicator);
    assert_eq!(prepared.columns()[1].source, "locale");
    assert_eq!(prepared.n_columns(), 1 + (3 - 1));
    Ok(())
}

#[test]
fn incomplete_units_are_dropped() -> Result<(), StrataError> {
    let table = small_table()?;
    let variables = vec![
        StratifyingVariable::continuous("enrolment"),
        StratifyingVariable::categorical("locale"),
    ];
    let prepared = prepare_table(&table, "id", &variables)?;

    assert_eq!(prepared.ids(), &[UnitId::Int(1), UnitId::Int(3), UnitId::Int(4)]);
    assert_eq!(prepared.dropped(), &[UnitId::Int(2)]);
    assert!(prepared.n_units() <= table.n_rows());
    assert_eq!(prepared.row(0), &[120.0, 0.0, 1.0]);
    assert_eq!(prepared.row(1), &[340.0, 1.0, 0.0]);
    assert_eq!(prepared.row(2), &[90.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn non_finite_numbers_are_treated_as_missing() -> Result<(), StrataError> {
    let mut table = PopulationTable::new();
    table.push_column("id", (1..=5).map(|i| Cell::Number(i as f64)).collect())?;
    table.push_column(
        "x",
        vec![
            Cell::Number(1.0),
            Cell::Number(f64::NAN),
            Cell::Number(3.0),
            Cell::Number(f64::INFINITY),
            Cell::Number(4.0),
        ],
    )?;
    table.push_column(
        "band",
        vec![
            Cell::Number(1.0),
            Cell::Number(2.0),
            Cell::Number(f64::NEG_INFINITY),
            Cell::Number(2.0),
            Cell::Number(1.0),
        ],
    )?;
    let variables = vec![
        StratifyingVariable::continuous("x"),
        StratifyingVariable::categorical("band"),
    ];
    let prepared = prepare_table(&table, "id", &variables)?;
    assert_eq!(prepared.ids(), &[UnitId::Int(1), UnitId::Int(5)]);
    assert_eq!(
        prepared.dropped(),
        &[UnitId::Int(2), UnitId::Int(3), UnitId::Int(4)]
    );
    assert_eq!(prepared.n_columns(), 2);

    let distances = compute_dissimilarity(&prepared);
    for i in 0..distances.len() {
        for j in 0..distances.len() {
            let d = distances.get(i, j);
            assert!((0.0..=1.0).contains(&d), "d({i},{j}) = {d}");
        }
    }
    Ok(())
}

#[test]
fn unknown_names_are_configuration_errors() -> Result<(), StrataError> {
    let table = small_table()?;
    let err = prepare_table(&table, "id", &[StratifyingVariable::continuous("pupils")])
        .expect_err("unknown variable");
    assert!(err.is_config());
    assert_eq!(err.info().code, "unknown-variable");

    let err = prepare_table(&table, "school", &[StratifyingVariable::continuous("enrolment")])
        .expect_err("unknown id");
    assert_eq!(err.info().code, "unknown-id-column");

    let err = prepare_table(&table, "id", &[StratifyingVariable::continuous("id")])
        .expect_err("id as variable");
    assert_eq!(err.info().code, "id-as-variable");

    let err = prepare_table(&table, "id", &[]).expect_err("empty selection");
    assert_eq!(err.info().code, "no-variables");
    Ok(())
}

#[test]
fn text_in_continuous_variable_is_a_data_error() -> Result<(), StrataError> {
    let table = small_table()?;
    let err = prepare_table(&table, "id", &[StratifyingVariable::continuous("locale")])
        .expect_err("text values");
    assert!(matches!(err, StrataError::Data(_)));
    assert_eq!(err.info().code, "non-numeric-value");
    Ok(())
}

#[test]
fn fully_missing_variable_is_excluded_not_fatal() -> Result<(), StrataError> {
    let table = small_table()?.with_column("budget", vec![Cell::Missing; 4])?;
    let variables = vec![
        StratifyingVariable::continuous("enrolment"),
        StratifyingVariable::continuous("budget"),
    ];
    let prepared = prepare_table(&table, "id", &variables)?;
    assert_eq!(prepared.excluded_variables(), &["budget".to_string()]);
    assert_eq!(prepared.n_columns(), 1);
    assert_eq!(prepared.n_units(), 3);
    Ok(())
}

#[test]
fn preparation_is_idempotent() -> Result<(), StrataError> {
    let table = common::school_population(120, 11);
    let variables = common::continuous_variables();
    let a = prepare_table(&table, "school_id", &variables)?;
    let b = prepare_table(&table, "school_id", &variables)?;
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
    Ok(())
}
