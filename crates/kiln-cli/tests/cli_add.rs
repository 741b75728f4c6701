use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn registry_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures/registry")
}

fn kiln_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env("KILN_HOME", home.path())
        .env_remove("KILN_REGISTRY")
        .env_remove("RUST_LOG");
    cmd
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Kiln.toml"),
        "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n\n# third-party\n[dependencies]\njson = \"3\"\n",
    )
    .unwrap();
    tmp
}

#[test]
fn test_add_latest_and_lock() {
    let home = TempDir::new().unwrap();
    let tmp = project();
    let registry = registry_dir();

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("--registry")
        .arg(&registry)
        .args(["add", "catch2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("catch2 ^3.4.0 to [dependencies]"))
        .stderr(predicate::str::contains("Locked"));

    let manifest = fs::read_to_string(tmp.path().join("Kiln.toml")).unwrap();
    assert!(manifest.contains("# third-party"));
    assert!(manifest.contains("catch2 = \"^3.4.0\""));

    let lock = fs::read_to_string(tmp.path().join("Kiln.lock")).unwrap();
    assert!(lock.contains("name = \"catch2\"\nversion = \"3.4.0\""));
}

#[test]
fn test_add_dev_without_lock() {
    let home = TempDir::new().unwrap();
    let tmp = project();

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("--registry")
        .arg(registry_dir())
        .args(["add", "fmt", "~9.1", "--dev", "--no-lock"])
        .assert()
        .success();

    let manifest = fs::read_to_string(tmp.path().join("Kiln.toml")).unwrap();
    assert!(manifest.contains("[dev-dependencies]\nfmt = \"~9.1\""));
    assert!(!tmp.path().join("Kiln.lock").exists());
}

#[test]
fn test_add_invalid_constraint_fails() {
    let home = TempDir::new().unwrap();
    let tmp = project();

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .arg("--registry")
        .arg(registry_dir())
        .args(["add", "fmt", "^^9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid constraint"));
}

#[test]
fn test_add_uses_global_config_registry() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("config.toml"),
        format!(
            "[registry]\nindex = \"{}\"\n",
            registry_dir().display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    let tmp = project();

    kiln_cmd(&home)
        .current_dir(tmp.path())
        .args(["add", "fmt", "9"])
        .assert()
        .success();
}
