use crate::common::TestProject;
use predicates::prelude::*;

#[test]
fn test_profile_lifecycle() {
    let project = TestProject::new().unwrap();

    project.ocx().args(["profile", "create", "work"]).assert().success();
    project.ocx().args(["profile", "create", "home"]).assert().success();
    project
        .ocx()
        .args(["profile", "create", "work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    project.ocx().args(["profile", "use", "work"]).assert().success();
    project
        .ocx()
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* work"))
        .stdout(predicate::str::contains("  home"));

    project
        .ocx()
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile: work"));

    project.ocx().args(["profile", "remove", "work"]).assert().success();
    project
        .ocx()
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active profile"));
}

#[test]
fn test_env_profile_selects_scope() {
    let project = TestProject::new().unwrap();
    project.ocx().args(["profile", "create", "ci"]).assert().success();

    project
        .ocx()
        .env("OCX_PROFILE", "ci")
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile: ci"));
}

#[test]
fn test_invalid_profile_name_rejected() {
    let project = TestProject::new().unwrap();
    project
        .ocx()
        .args(["profile", "create", "../escape"])
        .assert()
        .failure();
    assert!(!project.config_path().join("escape").exists());
}
