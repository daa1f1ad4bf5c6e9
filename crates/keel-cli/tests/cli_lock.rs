use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const LOCK: &str = r#"
revision = 2

[[package]]
source = "org/config"
version = "v1.0.0"
dependencies = [
    { package = "org/provider", type = "provider", version = ">=v0.1.0" },
    { package = "org/function", type = "function" },
]

[[package]]
source = "org/provider"
version = "v0.3.0"
dependencies = [{ package = "org/family", type = "provider" }]
"#;

fn keel_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.current_dir(tmp.path())
        .env("KEEL_HOME", tmp.path())
        .env_remove("KEEL_LOCK")
        .env_remove("RUST_LOG");
    cmd
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Keel.lock"), LOCK).unwrap();
    tmp
}

#[test]
fn test_lock_lists_packages_sorted() {
    let tmp = project();

    keel_cmd(&tmp)
        .args(["lock"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "org/config v1.0.0 (2 dependencies)\norg/provider v0.3.0 (1 dependency)",
        ));
}

#[test]
fn test_lock_without_file_is_empty() {
    let tmp = TempDir::new().unwrap();

    keel_cmd(&tmp)
        .args(["lock"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Empty"));
}

#[test]
fn test_lock_path_from_config() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("state")).unwrap();
    fs::write(tmp.path().join("state/fleet.lock"), LOCK).unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[lock]\npath = \"state/fleet.lock\"\n",
    )
    .unwrap();

    keel_cmd(&tmp)
        .args(["lock"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org/provider v0.3.0"));
}

#[test]
fn test_trace_marks_missing_packages() {
    let tmp = project();

    keel_cmd(&tmp)
        .args(["trace", "org/config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org/config:v1.0.0"))
        .stdout(predicate::str::contains("org/family (missing)"))
        .stdout(predicate::str::contains("org/function (missing)"))
        .stderr(predicate::str::contains("3 dependencies, 2 missing"));
}

#[test]
fn test_trace_depth_limits_output() {
    let tmp = project();

    keel_cmd(&tmp)
        .args(["trace", "org/config", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org/provider:v0.3.0"))
        .stdout(predicate::str::contains("org/family").not());
}

#[test]
fn test_trace_unknown_package_fails() {
    let tmp = project();

    keel_cmd(&tmp)
        .args(["trace", "org/unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not in"));
}
