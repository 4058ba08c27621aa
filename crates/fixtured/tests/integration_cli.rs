use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("fixtured").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Container test fixtures"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_version_output() {
    let mut cmd = Command::cargo_bin("fixtured").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "fixtured {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_run_help_lists_options() {
    let mut cmd = Command::cargo_bin("fixtured").unwrap();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--image"))
        .stdout(predicate::str::contains("--args"))
        .stdout(predicate::str::contains("--env-prefix"));
}

#[test]
fn test_run_without_image_fails() {
    let mut cmd = Command::cargo_bin("fixtured").unwrap();
    cmd.args(["run", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No image configured"));
}

#[test]
fn test_run_with_unbalanced_args_fails() {
    let mut cmd = Command::cargo_bin("fixtured").unwrap();
    cmd.args(["run", "--image", "alpine", "--args", "sh -c 'oops", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid container arguments"));
}

#[test]
fn test_run_with_missing_runtime_fails() {
    let mut cmd = Command::cargo_bin("fixtured").unwrap();
    cmd.args([
        "--runtime-path",
        "/nonexistent/fixtured-runtime",
        "run",
        "--image",
        "alpine",
        "--",
        "true",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Docker error"))
    .stderr(predicate::str::contains("not installed"));
}
