// End-to-end tests for the niftyc binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn niftyc() -> Command {
    let mut cmd = Command::cargo_bin("niftyc").unwrap();
    cmd.env_remove("NO_COLOR");
    cmd
}

#[test]
fn test_clean_file_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "ok.nif", "fn main() {\n  let x = 1;\n  return x;\n}\n");

    niftyc()
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsing ok.nif..."))
        .stderr(predicate::str::contains(
            "Parsed ok.nif: 1 top-level declarations, 0 errors, 0 warnings",
        ))
        .stderr(predicate::str::contains("no entry point").not());
}

#[test]
fn test_parse_errors_fail_with_excerpt() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "bad.nif", "fn main() {\n  let = 4;\n}\n");

    niftyc()
        .arg("--no-color")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bad.nif:L2,C7: Parse error: expected identifier"))
        .stderr(predicate::str::contains("2 |   let = 4;"))
        .stderr(predicate::str::contains("1 errors"));
}

#[test]
fn test_missing_file_is_a_usage_error() {
    niftyc()
        .arg("does/not/exist.nif")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load does/not/exist.nif"));
}

#[test]
fn test_token_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "tokens.nif", "val pi = 3.14;");

    niftyc()
        .arg("--tokens")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("== tokens.nif =="))
        .stdout(predicate::str::contains("Val"))
        .stdout(predicate::str::contains("\"3.14\""))
        .stdout(predicate::str::contains("Eof"));
}

#[test]
fn test_quiet_prints_diagnostics_only() {
    let dir = tempfile::tempdir().unwrap();
    let clean = write_source(&dir, "lib.nif", "let counter = 0;\n");
    let broken = write_source(&dir, "broken.nif", "let x = ;\n");

    niftyc()
        .arg("-q")
        .arg(&clean)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    niftyc()
        .args(["-q", "--no-color"])
        .arg(&clean)
        .arg(&broken)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Parsing").not())
        .stderr(predicate::str::contains("broken.nif:L1,C9: Parse error"));
}

#[test]
fn test_missing_entry_point_note() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "lib.nif", "fn helper() { }\n");

    niftyc()
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Note: no entry point 'fn main' declared"));
}
