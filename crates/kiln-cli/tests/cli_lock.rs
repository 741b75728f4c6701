use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn kiln_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env("KILN_HOME", home.path()).env_remove("KILN_REGISTRY").env_remove("RUST_LOG");
    cmd
}

fn registry_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures/registry")
}

fn project(deps: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Kiln.toml"),
        format!(
            "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[registry]\nindex = \"{}\"\n\n[dependencies]\n{deps}",
            registry_dir().display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    tmp
}

#[test]
fn test_lock_writes_lockfile() {
    let home = TempDir::new().unwrap();
    let tmp = project("spdlog = \"^1.10\"\njson = \"~3.11\"\n");

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("lock")
        .assert()
        .success()
        .stderr(predicate::str::contains("Locked"))
        .stderr(predicate::str::contains("3 package(s)"));

    let lock = fs::read_to_string(tmp.path().join("Kiln.lock")).unwrap();
    assert!(lock.contains("name = \"spdlog\"\nversion = \"1.11.0\""));
    assert!(lock.contains("name = \"fmt\"\nversion = \"9.1.0\""));
    assert!(lock.contains("name = \"json\"\nversion = \"3.11.3\""));
    assert!(lock.contains("manifest-hash"));
}

#[test]
fn test_lock_second_run_is_fresh() {
    let home = TempDir::new().unwrap();
    let tmp = project("json = \"3\"\n");

    kiln_cmd(&home).current_dir(tmp.path()).arg("lock").assert().success();
    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("lock")
        .assert()
        .success()
        .stderr(predicate::str::contains("Fresh"));
    kiln_cmd(&home)
        .current_dir(tmp.path())
        .args(["lock", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Locked"));
}

#[test]
fn test_lock_unresolvable_fails_with_package_name() {
    let home = TempDir::new().unwrap();
    let tmp = project("fmt = \">=11.0.0\"\n");

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("lock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("fmt"))
        .stderr(predicate::str::contains(">=11.0.0"));
    assert!(!tmp.path().join("Kiln.lock").exists());
}

#[test]
fn test_lock_strict_rejects_conflict() {
    let home = TempDir::new().unwrap();
    // spdlog 1.11.0 wants fmt ^9.1 while the project asks for ^10.
    let tmp = project("spdlog = \"1.11\"\nfmt = \"^10\"\n");

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("lock")
        .assert()
        .success()
        .stderr(predicate::str::contains("Collapsed"));

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .args(["lock", "--force", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`fmt`"))
        .stderr(predicate::str::contains("10.2.1"));
}

#[test]
fn test_lock_outside_project_fails() {
    let home = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("lock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Kiln.toml"));
}
