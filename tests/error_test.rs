//! Tests for error types

use std::path::PathBuf;

use facewatch::Error;

#[test]
fn test_schema_locked_error() {
    let error = Error::SchemaLocked { rows: 3 };
    let error_str = format!("{error}");
    assert!(error_str.contains("Schema locked"));
    assert!(error_str.contains("3 row(s)"));
    assert!(error_str.contains("Declare every metric before the loop starts"));
}

#[test]
fn test_schema_mismatch_error() {
    let error = Error::SchemaMismatch {
        expected: vec!["fps".to_string(), "t_total".to_string()],
        got: vec!["fps".to_string()],
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Schema mismatch"));
    assert!(error_str.contains("t_total"));
}

#[test]
fn test_unsupported_period_error() {
    let error = Error::UnsupportedPeriod("fortnight".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("fortnight"));
    assert!(error_str.contains("second, minute, hour, day"));
}

#[test]
fn test_invalid_graph_error() {
    let error = Error::InvalidGraph("index 'depth' not in attributes".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid graph"));
    assert!(error_str.contains("depth"));
}

#[test]
fn test_no_data_error() {
    let error = Error::NoData(PathBuf::from("benchmark"));
    let error_str = format!("{error}");
    assert!(error_str.contains("No data"));
    assert!(error_str.contains("benchmark"));
}

#[test]
fn test_job_failed_error() {
    let error = Error::JobFailed {
        job: "rotate".to_string(),
        message: "disk full".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("'rotate'"));
    assert!(error_str.contains("disk full"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("file not found".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("every must be positive".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("every must be positive"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "segment missing");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("segment missing"));
}

#[test]
fn test_transient_classification() {
    assert!(Error::CaptureFailure("camera busy".to_string()).is_transient());
    assert!(Error::NoData(PathBuf::from("x")).is_transient());
    assert!(!Error::SchemaLocked { rows: 1 }.is_transient());
    assert!(!Error::Config("bad".to_string()).is_transient());
}

#[test]
fn test_error_debug() {
    let error = Error::Other("test".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Other"));
}
