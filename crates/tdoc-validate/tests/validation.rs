//! End-to-end validation scenarios

use std::fs;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tdoc_test_utils::{
    nested_app, write_app, DEPRECATED_WIDGET_APP, MISSING_IMPORT_APP, UNBALANCED_CSS_APP,
    VALID_APP,
};
use tdoc_validate::scan::{collect_files, validate_all};
use tdoc_validate::{IssueCode, ScanOptions, ScanSummary, ValidateOptions, Validator};

#[test]
fn valid_app_passes_cleanly() {
    let session = Validator::default().validate_source(VALID_APP);
    assert!(session.passed());
    assert!(session.warnings().is_empty(), "{:?}", session.warnings());
    assert!(session.suggestions().is_empty());
}

#[test]
fn no_app_class_is_one_error() {
    let source = "from textual.app import App, ComposeResult\n\n\nclass Helper:\n    pass\n";
    let session = Validator::default().validate_source(source);
    assert_eq!(session.errors().len(), 1);
    assert!(session.errors()[0].message().contains("No application class found"));
}

#[test]
fn single_yield_warns_but_passes() {
    let source = "from textual.app import App, ComposeResult\n\
                  from textual.widgets import Button\n\n\n\
                  class MyApp(App):\n    def compose(self):\n        yield Button(\"x\")\n";
    let session = Validator::default().validate_source(source);

    assert!(session.passed());
    assert!(session.issues_with(IssueCode::UnknownWidget).is_empty());
    let yields = session.issues_with(IssueCode::ComposeYields);
    assert_eq!(yields.len(), 1);
    assert_eq!(
        yields[0].message(),
        "compose method should yield at least Header and Footer"
    );
}

#[test]
fn unbalanced_style_block_cites_line() {
    let session = Validator::default().validate_source(UNBALANCED_CSS_APP);
    assert_eq!(session.errors().len(), 1);
    assert_eq!(session.errors()[0].code(), IssueCode::StyleUnclosedBlock);
    assert_eq!(
        session.errors()[0].message(),
        "Unclosed CSS block starting at line 6"
    );
}

#[test]
fn deprecated_widget_names_replacement() {
    let session = Validator::default().validate_source(DEPRECATED_WIDGET_APP);
    assert!(!session.passed());
    let deprecated = session.issues_with(IssueCode::DeprecatedWidget);
    assert_eq!(deprecated.len(), 1);
    assert!(deprecated[0].message().contains("'RichLog'"));
}

#[test]
fn syntax_error_stops_checks() {
    let session = Validator::default().validate_source("class Broken(App)\n    pass\n");
    assert_eq!(session.errors().len(), 1);
    assert_eq!(session.errors()[0].code(), IssueCode::Syntax);
    assert!(session.warnings().is_empty());
}

#[test]
fn missing_file_fails() {
    let result = Validator::default().validate_file(std::path::Path::new("/nonexistent/app.py"));
    assert!(!result.passed());
    assert!(result.session.has_error(IssueCode::FileNotFound));
}

#[test]
fn fix_round_trip_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_app(dir.path(), "app.py", MISSING_IMPORT_APP);
    let fixing = Validator::new(ValidateOptions::default().with_fix(true));

    let first = fixing.validate_file(&path);
    assert_eq!(first.session.fixes_applied().len(), 1);
    assert!(!first.session.has_error(IssueCode::MissingAppImport));
    assert_eq!(first.session.issues_with(IssueCode::FixApplied).len(), 1);

    let fixed = fs::read_to_string(&path).unwrap();
    assert!(fixed.starts_with("from textual.app import ComposeResult, App\n"));
    assert!(Validator::default().validate_file(&path).passed());

    let second = fixing.validate_file(&path);
    assert!(second.session.fixes_applied().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), fixed);
}

#[test]
fn fix_clears_errors_until_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let source = MISSING_IMPORT_APP.replace("yield Header()", "yield HeaderTui()");
    let path = write_app(dir.path(), "app.py", &source);

    let result = Validator::new(ValidateOptions::default().with_fix(true)).validate_file(&path);
    assert_eq!(result.session.fixes_applied().len(), 1);
    assert!(result.passed());
    let rerun = result.session.issues_with(IssueCode::FixApplied);
    assert_eq!(rerun.len(), 1);
    assert_eq!(rerun[0].message(), "Auto-fixes applied. Re-run validation.");

    let again = Validator::default().validate_file(&path);
    assert!(!again.passed());
    assert!(again.session.has_error(IssueCode::DeprecatedWidget));
    assert!(!again.session.has_error(IssueCode::MissingAppImport));
}

#[test]
fn directory_scan_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path(), "one.py", VALID_APP);
    write_app(dir.path(), "two.py", VALID_APP);
    write_app(dir.path(), "three.py", DEPRECATED_WIDGET_APP);

    let files = collect_files(dir.path(), &ScanOptions::default()).unwrap();
    let results = validate_all(&Validator::default(), &files);
    let summary = ScanSummary::from_results(&results);

    assert_eq!(
        summary,
        ScanSummary {
            total: 3,
            passed: 2,
            failed: 1
        }
    );
    assert!(summary.to_string().contains("Success rate:  66.7%"));
    let failed: Vec<_> = results.iter().filter(|r| !r.passed()).collect();
    assert!(failed[0].path.ends_with("three.py"));
}

proptest! {
    #[test]
    fn nesting_warning_iff_deeper_than_five(levels in 1usize..10) {
        let session = Validator::default().validate_source(&nested_app(levels));
        let warned = !session.issues_with(IssueCode::DeepNesting).is_empty();
        prop_assert_eq!(warned, levels > 5);
    }
}
