//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_clean_missing_input_exits_with_input_error() {
    let mut cmd = Command::cargo_bin("tanzif-pdf").unwrap();
    cmd.args(["clean", "/nonexistent/kitab.pdf"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_info_runs() {
    let mut cmd = Command::cargo_bin("tanzif-pdf").unwrap();
    cmd.arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("tanzif-pdf"))
        .stdout(predicate::str::contains("Poppler"));
}

#[test]
fn test_clean_help_lists_options() {
    let mut cmd = Command::cargo_bin("tanzif-pdf").unwrap();
    cmd.args(["clean", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dpi"))
        .stdout(predicate::str::contains("--no-center"))
        .stdout(predicate::str::contains("--ocr-lang"));
}

#[test]
fn test_empty_directory_reports_no_pdfs() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("tanzif-pdf").unwrap();
    cmd.arg("clean")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no PDF files"));
}
