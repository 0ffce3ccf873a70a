use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn specgen() -> Command {
    Command::cargo_bin("specgen").unwrap()
}

#[test]
fn test_generate_writes_module() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out");

    specgen()
        .arg("generate")
        .arg(fixture("hello.json"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello_cli_cfg.rs"));

    let generated = std::fs::read_to_string(output.join("demo").join("hello_cli_cfg.rs")).unwrap();
    assert!(generated.starts_with("// @generated by specgen"));
    assert!(generated.contains("create_cmd_spec"));
    assert!(generated.contains("configure_options"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out");

    specgen()
        .args(["generate", "--dry-run"])
        .arg(fixture("hello.json"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("create_cmd_spec"));

    assert!(!output.exists());
}

#[test]
fn test_inspect_json_lists_declarations() {
    specgen()
        .args(["inspect", "--json"])
        .arg(fixture("hello.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"demo.Hello\""))
        .stdout(predicate::str::contains("\"depth\""));
}

#[test]
fn test_replay_prints_spec() {
    specgen()
        .arg("replay")
        .arg(fixture("hello.json"))
        .arg("demo.Hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"hello\""))
        .stdout(predicate::str::contains("--count"));
}

#[test]
fn test_replay_unknown_element_fails() {
    specgen()
        .arg("replay")
        .arg(fixture("hello.json"))
        .arg("demo.Missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("demo.Missing"));
}

#[test]
fn test_missing_manifest_fails() {
    let temp_dir = TempDir::new().unwrap();

    specgen()
        .arg("generate")
        .arg(temp_dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Manifest not found"));
}
