use strata_core::{Cell, PipelineEvent, PopulationTable, StrataError, UnitId, VariableKind};

fn numbers(values: &[f64]) -> Vec<Cell> {
    values.iter().copied().map(Cell::Number).collect()
}

#[test]
fn ragged_columns_are_rejected() {
    let table = PopulationTable::new()
        .with_column("id", numbers(&[1.0, 2.0, 3.0]))
        .expect("first column");
    let err = table
        .with_column("total", numbers(&[10.0, 20.0]))
        .expect_err("ragged");
    assert_eq!(err.info().code, "ragged-column");
}

#[test]
fn unit_ids_reject_duplicates_and_missing() -> Result<(), StrataError> {
    let table = PopulationTable::new().with_column("id", numbers(&[1.0, 2.0, 1.0]))?;
    let err = table.unit_ids("id").expect_err("duplicate");
    assert_eq!(err.info().code, "duplicate-unit-id");

    let table = PopulationTable::new().with_column("id", vec![Cell::Number(1.0), Cell::Missing])?;
    let err = table.unit_ids("id").expect_err("missing");
    assert_eq!(err.info().code, "missing-unit-id");

    let err = table.unit_ids("school").expect_err("unknown");
    assert!(err.is_config());
    Ok(())
}

#[test]
fn from_rows_transposes_records() -> Result<(), StrataError> {
    let header = vec!["id".to_string(), "locale".to_string()];
    let rows = vec![
        vec![Cell::parse("a1"), Cell::parse("urban")],
        vec![Cell::parse("a2"), Cell::parse("")],
    ];
    let table = PopulationTable::from_rows(&header, rows)?;
    assert_eq!(table.n_rows(), 2);
    assert_eq!(
        table.unit_ids("id")?,
        vec![UnitId::from("a1"), UnitId::from("a2")]
    );
    let locale = table.column("locale").expect("locale column");
    assert_eq!(locale.infer_kind(), VariableKind::Categorical);
    assert!(locale.cells[1].is_missing());
    Ok(())
}

#[test]
fn events_serialise_with_tags() {
    let event = PipelineEvent::ClusteringIteration {
        restart: 0,
        iteration: 2,
        within_ss: 1.5,
    };
    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["event"], "clustering_iteration");
    assert_eq!(value["iteration"], 2);
}

#[test]
fn non_finite_numbers_count_as_missing() {
    assert!(Cell::Number(f64::NAN).is_missing());
    assert!(Cell::Number(f64::INFINITY).is_missing());
    assert!(!Cell::Number(0.0).is_missing());
    assert_eq!(Cell::Number(f64::NAN).level_label(), None);
    assert_eq!(UnitId::from_cell(&Cell::Number(f64::NAN)), None);
}
