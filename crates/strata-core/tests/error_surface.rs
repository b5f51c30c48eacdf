use strata_core::errors::{ErrorInfo, StrataError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("column", "pct_female")
        .with_context("row", 3)
}

#[test]
fn config_error_surface() {
    let err = StrataError::Config(sample_info("invalid-n-strata", "n_strata must exceed 1"));
    assert_eq!(err.info().code, "invalid-n-strata");
    assert!(err.info().context.contains_key("column"));
    assert!(err.is_config());
}

#[test]
fn data_error_surface() {
    let err = StrataError::Data(sample_info("duplicate-unit-id", "ids must be unique"));
    assert_eq!(err.info().code, "duplicate-unit-id");
    assert_eq!(err.info().context.get("row").map(String::as_str), Some("3"));
    assert!(!err.is_config());
}

#[test]
fn display_includes_context_and_hint() {
    let err = StrataError::Numeric(
        ErrorInfo::new("singular", "covariance is singular")
            .with_context("stratum", 2)
            .with_hint("check for constant variables"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("numeric error: covariance is singular (code: singular)"));
    assert!(rendered.contains("stratum=2"));
    assert!(rendered.contains("hint: check for constant variables"));
}

#[test]
fn errors_roundtrip_through_json() {
    let err = StrataError::Serde(sample_info("yaml_deserialize", "bad document"));
    let json = serde_json::to_string(&err).expect("serialize");
    let back: StrataError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(err, back);
}
