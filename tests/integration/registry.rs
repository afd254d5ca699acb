use crate::common::TestProject;
use predicates::prelude::*;

#[test]
fn test_registry_add_list_remove() {
    let project = TestProject::new().unwrap();
    project.ocx().arg("init").assert().success();

    project
        .ocx()
        .args(["registry", "add", "kdco", "https://registry.kdco.dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added registry 'kdco'"));
    project
        .ocx()
        .args(["registry", "add", "team", "https://team.example.com/"])
        .assert()
        .success();

    let output = project.ocx().args(["registry", "list"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let kdco = stdout.find("kdco").unwrap();
    let team = stdout.find("team").unwrap();
    assert!(kdco < team, "registries keep insertion order:\n{stdout}");
    assert!(stdout.contains("https://team.example.com\n"));

    project.ocx().args(["registry", "remove", "kdco"]).assert().success();
    project
        .ocx()
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kdco").not());
}

#[test]
fn test_registry_add_goes_to_active_profile() {
    let project = TestProject::new().unwrap();
    project.ocx().args(["profile", "create", "work"]).assert().success();

    project
        .ocx()
        .args(["--profile", "work", "registry", "add", "p", "https://p.example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("profile:work"));

    assert!(!project.project_path().join(".opencode/ocx.jsonc").exists());
    let profile_config =
        std::fs::read_to_string(project.config_path().join("profiles/work/ocx.jsonc")).unwrap();
    assert!(profile_config.contains("https://p.example.com"));
}

#[test]
fn test_registry_remove_unknown_fails() {
    let project = TestProject::new().unwrap();
    project
        .ocx()
        .args(["registry", "remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}
