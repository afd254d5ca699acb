use crate::common::TestProject;
use predicates::prelude::*;

#[test]
fn test_missing_profile_is_reported() {
    let project = TestProject::new().unwrap();
    project
        .ocx()
        .args(["--profile", "ghosty", "config", "show"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ghosty"));
}

#[test]
fn test_malformed_config_is_reported() {
    let project = TestProject::new().unwrap();
    project.write_file(".opencode/ocx.jsonc", "{ not json").unwrap();
    project
        .ocx()
        .args(["config", "show"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ocx.jsonc"));
}

#[test]
fn test_list_with_nothing_installed() {
    let project = TestProject::new().unwrap();
    project
        .ocx()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No components installed"));
}
