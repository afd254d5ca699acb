use crate::common::TestProject;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use predicates::prelude::*;
use std::process::Stdio;
use std::time::{Duration, Instant};

fn project_with_profile() -> TestProject {
    let project = TestProject::new().unwrap();
    project.write_file("src/main.rs", "fn main() {}\n").unwrap();
    project.write_file("secret/key", "hunter2\n").unwrap();
    project.write_file("opencode.jsonc", r#"{ "theme": "dark" }"#).unwrap();

    project.ocx().args(["profile", "create", "work"]).assert().success();
    let profile_dir = project.config_path().join("profiles/work");
    std::fs::write(
        profile_dir.join("ocx.jsonc"),
        r#"{ "exclude": ["opencode.jsonc", "secret/**"] }"#,
    )
    .unwrap();
    std::fs::write(profile_dir.join("opencode.jsonc"), r#"{ "model": "ghost-model" }"#).unwrap();
    project
}

#[test]
fn test_ghost_run_sees_filtered_tree_and_injected_config() {
    let project = project_with_profile();

    project
        .ocx()
        .args([
            "--profile",
            "work",
            "ghost",
            "run",
            "--",
            "sh",
            "-c",
            "test -e src/main.rs && test ! -e opencode.jsonc && test ! -e secret/key \
             && echo \"$OPENCODE_CONFIG_CONTENT\" && echo \"profile=$OCX_PROFILE\"",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ghost-model"))
        .stdout(predicate::str::contains("dark"))
        .stdout(predicate::str::contains("profile=work"));

    assert!(project.tmp_entries().is_empty(), "sandbox left behind: {:?}", project.tmp_entries());
}

#[test]
fn test_ghost_run_propagates_exit_code() {
    let project = project_with_profile();
    project
        .ocx()
        .args(["--profile", "work", "ghost", "run", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);
    assert!(project.tmp_entries().is_empty());
}

#[test]
fn test_ghost_run_forwards_sigterm_and_removes_sandbox() {
    let project = project_with_profile();
    let mut child = project
        .ocx_process()
        .args([
            "--profile",
            "work",
            "ghost",
            "run",
            "--",
            "sh",
            "-c",
            "trap 'exit 42' TERM; touch started; sleep 30 & wait",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(20);
    while !project
        .tmp_entries()
        .iter()
        .any(|name| project.tmp_path().join(name).join("started").exists())
    {
        assert!(Instant::now() < deadline, "sandboxed command never started");
        std::thread::sleep(Duration::from_millis(20));
    }

    kill(Pid::from_raw(i32::try_from(child.id()).unwrap()), Signal::SIGTERM).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(42));
    assert!(project.tmp_entries().is_empty(), "sandbox left behind: {:?}", project.tmp_entries());
}

#[test]
fn test_ghost_run_keep_sandbox() {
    let project = project_with_profile();
    project
        .ocx()
        .args(["--profile", "work", "ghost", "run", "--keep-sandbox", "--", "true"])
        .assert()
        .success();

    let entries = project.tmp_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("ocx-ghost-"));
    assert!(project.tmp_path().join(&entries[0]).join("src/main.rs").exists());
}

#[test]
fn test_ghost_run_unknown_command() {
    let project = TestProject::new().unwrap();
    project
        .ocx()
        .args(["ghost", "run", "--", "ocx-definitely-missing-tool"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ocx-definitely-missing-tool"));
    assert!(project.tmp_entries().is_empty());
}

#[test]
fn test_ghost_sweep_removes_orphans_only() {
    let project = TestProject::new().unwrap();
    let orphan = project.tmp_path().join("ocx-ghost-1234.removing");
    std::fs::create_dir_all(orphan.join("nested")).unwrap();
    let unrelated = project.tmp_path().join("something-else");
    std::fs::create_dir_all(&unrelated).unwrap();

    project
        .ocx()
        .args(["ghost", "sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1"));

    assert!(!orphan.exists());
    assert!(unrelated.exists());
}
