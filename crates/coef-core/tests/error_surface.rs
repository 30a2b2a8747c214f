use coef_core::errors::{CoefError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("group", "snap_000.asc")
        .with_context("reason", "example")
}

#[test]
fn per_group_errors_are_recoverable() {
    let errors = [
        CoefError::GroupLoad(sample_info("G001", "truncated file")),
        CoefError::UnknownComponentType(sample_info("U001", "no such component")),
        CoefError::EmptySelection(sample_info("E001", "zero particles")),
        CoefError::BasisComputation(sample_info("B001", "degenerate")),
    ];
    for err in &errors {
        assert!(err.is_recoverable(), "{} should be recoverable", err.kind());
        assert!(!err.is_contract_violation());
        assert!(err.info().context.contains_key("group"));
    }
}

#[test]
fn accumulator_errors_are_contract_violations() {
    let errors = [
        CoefError::OutOfOrderTime(sample_info("O001", "time went backwards")),
        CoefError::IncompatibleBasis(sample_info("I001", "shape mismatch")),
        CoefError::SeriesClosed(sample_info("S001", "finalized")),
    ];
    for err in &errors {
        assert!(err.is_contract_violation());
        assert!(!err.is_recoverable());
    }
}

#[test]
fn manifest_errors_are_fatal() {
    let missing = CoefError::ManifestNotFound(sample_info("M001", "missing"));
    let parse = CoefError::ManifestParse(sample_info("M002", "bad token"));
    assert!(!missing.is_recoverable());
    assert!(!parse.is_recoverable());
    assert_eq!(missing.kind(), "manifest-not-found");
    assert_eq!(parse.kind(), "manifest-parse");

    let diag = CoefError::Diagnostic(sample_info("D001", "no header"));
    assert!(!diag.is_recoverable());
    assert!(!diag.is_contract_violation());
    assert_eq!(diag.kind(), "diagnostic");
}

#[test]
fn display_includes_context_and_hint() {
    let err = CoefError::Config(
        ErrorInfo::new("basis-param-missing", "missing basis parameter")
            .with_context("parameter", "nmax")
            .with_hint("add nmax to the basis file"),
    );
    let text = err.to_string();
    assert!(text.starts_with("config error: missing basis parameter"));
    assert!(text.contains("parameter=nmax"));
    assert!(text.contains("hint: add nmax"));
}

#[test]
fn errors_round_trip_through_json() {
    let err = CoefError::OutOfOrderTime(sample_info("accumulator-out-of-order", "stale time"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"OutOfOrderTime\""));
    let decoded: CoefError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
