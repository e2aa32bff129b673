use tempfile::TempDir;

use ms_harness::console_log::{check_file, ConsoleErrorLog};
use ms_harness::error::HarnessError;

#[test]
fn test_benign_noise_is_allowed() {
    let mut log = ConsoleErrorLog::new();
    log.record("Refused to load the script because it violates the Content-Security-Policy directive");
    log.record("[Report Only] Refused to connect to wss://example");
    log.record("Failed to load resource: https://www.googletagmanager.com/gtag/js");
    log.record("GET https://www.magicsuite.net/favicon.ico 404 (Not Found)");

    assert_eq!(log.len(), 4);
    assert!(log.unexpected().is_empty());
    assert!(log.is_clean());
}

#[test]
fn test_real_errors_are_not_allowed() {
    let mut log = ConsoleErrorLog::new();
    log.record("Uncaught TypeError: Cannot read properties of undefined (reading 'tenantId')");
    log.record("Refused to load the script: Content-Security-Policy");

    let unexpected = log.unexpected();
    assert_eq!(unexpected.len(), 1);
    assert!(unexpected[0].contains("TypeError"));
    assert!(!log.is_clean());
}

#[test]
fn test_empty_log_is_clean() {
    let log = ConsoleErrorLog::new();
    assert!(log.is_empty());
    assert!(log.is_clean());
}

#[test]
fn test_custom_patterns() {
    let mut log = ConsoleErrorLog::with_patterns(&[r"(?i)deprecated"]).unwrap();
    log.record("Warning: componentWillMount is deprecated");
    log.record("Uncaught ReferenceError: gtag is not defined");

    // Custom patterns replace the defaults entirely.
    let unexpected = log.unexpected();
    assert_eq!(unexpected.len(), 1);
    assert!(unexpected[0].contains("ReferenceError"));
}

#[test]
fn test_invalid_pattern_is_reported() {
    let err = ConsoleErrorLog::with_patterns(&["(unclosed"]).unwrap_err();
    assert!(matches!(err, HarnessError::Pattern(_)));
}

#[test]
fn test_check_file_skips_blank_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("console.log");
    std::fs::write(
        &path,
        "Content-Security-Policy violation in report-only mode\n\
         \n\
         Uncaught TypeError: x is not a function\n\
         \n",
    )
    .unwrap();

    let unexpected = check_file(&path).unwrap();
    assert_eq!(unexpected.len(), 1);
    assert!(unexpected[0].contains("TypeError"));
}

#[test]
fn test_check_file_missing_file_errors() {
    let dir = TempDir::new().unwrap();
    let err = check_file(&dir.path().join("nope.log")).unwrap_err();
    assert!(matches!(err, HarnessError::Io(_)));
}
