use crate::common::TestProject;
use predicates::prelude::*;

#[test]
fn test_init_creates_local_config() {
    let project = TestProject::new().unwrap();

    project
        .ocx()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    let config = project.project_path().join(".opencode/ocx.jsonc");
    assert!(config.exists());
    let content = std::fs::read_to_string(config).unwrap();
    assert!(content.contains("\"registries\""));
}

#[test]
fn test_init_twice_requires_force() {
    let project = TestProject::new().unwrap();
    project.ocx().arg("init").assert().success();

    project
        .ocx()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    project.ocx().args(["init", "--force"]).assert().success();
}
