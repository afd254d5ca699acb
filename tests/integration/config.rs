use crate::common::TestProject;
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn test_config_show_prints_resolved_json() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            ".opencode/ocx.jsonc",
            r#"{
                // comments and trailing commas are fine
                "registries": { "kdco": { "url": "https://registry.kdco.dev" }, },
                "exclude": ["secrets/**"],
            }"#,
        )
        .unwrap();
    project.write_file("opencode.jsonc", r#"{ "theme": "dark" }"#).unwrap();

    let output = project.ocx().args(["config", "show"]).output().unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["registries"]["kdco"]["url"], "https://registry.kdco.dev");
    assert_eq!(json["opencode"]["theme"], "dark");
    assert_eq!(json["exclude"][0], "secrets/**");
}

#[test]
fn test_config_show_origin_with_profile() {
    let project = TestProject::new().unwrap();
    project.ocx().args(["profile", "create", "work"]).assert().success();
    std::fs::write(
        project.config_path().join("profiles/work/opencode.jsonc"),
        r#"{ "model": "from-profile", "theme": "light" }"#,
    )
    .unwrap();
    project.write_file("opencode.jsonc", r#"{ "theme": "dark" }"#).unwrap();

    project
        .ocx()
        .args(["--profile", "work", "config", "show", "--origin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"theme\": \"dark\""))
        .stdout(predicate::str::is_match(r"opencode\.model\s+profile:work").unwrap())
        .stdout(predicate::str::is_match(r"opencode\.theme\s+local").unwrap());
}

#[test]
fn test_profile_scope_ignores_local_registries() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            ".opencode/ocx.jsonc",
            r#"{ "registries": { "local-only": { "url": "https://local.example.com" } } }"#,
        )
        .unwrap();
    project.ocx().args(["profile", "create", "work"]).assert().success();

    project
        .ocx()
        .args(["--profile", "work", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local-only").not());
}
