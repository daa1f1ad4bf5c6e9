use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const META: &str = r#"
kind = "Configuration"
name = "config-nop-a"

[[depends-on]]
provider = "not-here-1"
version = ">=v0.1.0"

[[depends-on]]
provider = "not-here-2"
version = ">=v0.1.0"
"#;

fn keel_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.env("KEEL_HOME", home.path())
        .env_remove("KEEL_LOCK")
        .env_remove("RUST_LOG");
    cmd
}

fn project(lock: Option<&str>) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("meta.toml"), META).unwrap();
    if let Some(lock) = lock {
        fs::write(tmp.path().join("Keel.lock"), lock).unwrap();
    }
    tmp
}

fn installed(one: &str, two: &str) -> String {
    format!(
        r#"
[[package]]
source = "hasheddan/config-nop-a"
version = "v0.0.1"
dependencies = [
    {{ package = "not-here-1", type = "provider", version = ">=v0.1.0" }},
    {{ package = "not-here-2", type = "provider", version = ">=v0.1.0" }},
]

[[package]]
source = "not-here-1"
version = "{one}"

[[package]]
source = "not-here-2"
version = "{two}"
"#
    )
}

#[test]
fn test_resolve_missing_dependencies_fails() {
    let tmp = project(None);

    keel_cmd(&tmp)
        .current_dir(tmp.path())
        .args([
            "resolve",
            "--meta",
            "meta.toml",
            "--package",
            "hasheddan/config-nop-a:v0.0.1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing dependencies: not-here-1, not-here-2"));

    let lock = fs::read_to_string(tmp.path().join("Keel.lock")).unwrap();
    assert!(lock.contains("hasheddan/config-nop-a"));
}

#[test]
fn test_resolve_json_report() {
    let tmp = project(Some(&installed("v0.20.0", "v0.100.1")));

    keel_cmd(&tmp)
        .current_dir(tmp.path())
        .args([
            "resolve",
            "--meta",
            "meta.toml",
            "--package",
            "hasheddan/config-nop-a:v0.0.1",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 2"))
        .stdout(predicate::str::contains("\"installed\": 2"))
        .stdout(predicate::str::contains("\"invalid\": 0"));
}

#[test]
fn test_resolve_incompatible_versions_fails() {
    let tmp = project(Some(&installed("v0.0.1", "v0.0.1")));

    keel_cmd(&tmp)
        .current_dir(tmp.path())
        .args([
            "resolve",
            "--meta",
            "meta.toml",
            "--package",
            "hasheddan/config-nop-a:v0.0.1",
            "--json",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"invalid\": 2"))
        .stderr(predicate::str::contains("incompatible dependencies"));
}

#[test]
fn test_resolve_inactive_removes_package() {
    let tmp = project(Some(&installed("v0.20.0", "v0.100.1")));

    keel_cmd(&tmp)
        .current_dir(tmp.path())
        .args([
            "resolve",
            "--meta",
            "meta.toml",
            "--package",
            "hasheddan/config-nop-a:v0.0.1",
            "--inactive",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    let lock = fs::read_to_string(tmp.path().join("Keel.lock")).unwrap();
    assert!(!lock.contains("hasheddan/config-nop-a"));
    assert!(lock.contains("not-here-1"));
}

#[test]
fn test_resolve_honours_lock_env() {
    let tmp = project(None);

    keel_cmd(&tmp)
        .current_dir(tmp.path())
        .env("KEEL_LOCK", "state/other.lock")
        .args([
            "resolve",
            "--meta",
            "meta.toml",
            "--package",
            "hasheddan/config-nop-a",
        ])
        .assert()
        .failure();

    assert!(!tmp.path().join("Keel.lock").exists());
    let lock = fs::read_to_string(tmp.path().join("state/other.lock")).unwrap();
    assert!(lock.contains("version = \"latest\""));
}

#[test]
fn test_resolve_unknown_kind_fails() {
    let tmp = project(None);
    fs::write(tmp.path().join("meta.toml"), "kind = \"Widget\"\n").unwrap();

    keel_cmd(&tmp)
        .current_dir(tmp.path())
        .args(["resolve", "--meta", "meta.toml", "--package", "org/a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid input"));

    assert!(!tmp.path().join("Keel.lock").exists());
}
