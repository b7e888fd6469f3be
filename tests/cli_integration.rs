use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn stowdb(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stowdb").unwrap();
    cmd.arg("--device-root")
        .arg(temp.path().join("device"))
        .arg("--external-root")
        .arg(temp.path().join("external"));
    cmd
}

fn seed_database(root: &Path, name: &str, content: &[u8]) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join(format!("{}.s3db", name)), content).unwrap();
}

#[test]
fn test_status_on_fresh_store() {
    let temp = TempDir::new().unwrap();

    stowdb(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("device"))
        .stdout(predicate::str::contains("read-write"));
}

#[test]
fn test_explicit_roots_work_without_a_home_dir() {
    let temp = TempDir::new().unwrap();
    seed_database(&temp.path().join("device"), "comics", b"issue #1");

    // With both roots given, no platform data dir lookup should happen.
    stowdb(&temp)
        .env_remove("HOME")
        .env_remove("XDG_DATA_HOME")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("device"));
}

#[test]
fn test_mode_switch_moves_files() {
    let temp = TempDir::new().unwrap();
    seed_database(&temp.path().join("device"), "comics", b"issue #1");
    fs::create_dir_all(temp.path().join("external")).unwrap();

    stowdb(&temp)
        .args(["mode", "external"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to external"));

    assert!(temp.path().join("external").join("comics.s3db").exists());
    assert!(!temp.path().join("device").join("comics.s3db").exists());

    stowdb(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("external"));
}

#[test]
fn test_checksum_then_verify() {
    let temp = TempDir::new().unwrap();
    seed_database(&temp.path().join("device"), "comics", b"issue #1");

    stowdb(&temp)
        .args(["checksum", "comics"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{32}\n$").unwrap());

    stowdb(&temp)
        .args(["verify", "comics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verified"));
}

#[test]
fn test_verify_detects_corruption() {
    let temp = TempDir::new().unwrap();
    let device = temp.path().join("device");
    seed_database(&device, "comics", b"issue #1");

    stowdb(&temp).args(["checksum", "comics"]).assert().success();
    fs::write(device.join("comics.s3db"), b"tampered").unwrap();

    stowdb(&temp)
        .args(["verify", "comics"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("mismatch"));
}

#[test]
fn test_verify_without_sidecar_is_unverifiable() {
    let temp = TempDir::new().unwrap();
    seed_database(&temp.path().join("device"), "comics", b"issue #1");

    stowdb(&temp)
        .args(["verify", "comics"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Cannot verify"));
}

#[test]
fn test_verify_against_expected_value() {
    let temp = TempDir::new().unwrap();
    seed_database(&temp.path().join("device"), "comics", b"hello world");

    stowdb(&temp)
        .args([
            "verify",
            "comics",
            "--expected",
            "5EB63BBBE01EEED093CB22BB8F5ACDC3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verified"));
}

#[test]
fn test_list_shows_databases() {
    let temp = TempDir::new().unwrap();
    let device = temp.path().join("device");
    seed_database(&device, "comics", b"issue #1");
    seed_database(&device, "archive", b"old issues");

    stowdb(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("comics"))
        .stdout(predicate::str::contains("archive"))
        .stdout(predicate::str::contains("unverified"));
}

#[test]
fn test_delete_removes_database_and_sidecar() {
    let temp = TempDir::new().unwrap();
    let device = temp.path().join("device");
    seed_database(&device, "comics", b"issue #1");

    stowdb(&temp).args(["checksum", "comics"]).assert().success();
    stowdb(&temp)
        .args(["delete", "comics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    assert!(!device.join("comics.s3db").exists());
    assert!(!device.join("comics.csm").exists());

    stowdb(&temp).args(["delete", "comics"]).assert().code(1);
}

#[test]
fn test_unknown_database_checksum_fails() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("device")).unwrap();

    stowdb(&temp)
        .args(["checksum", "nope"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No such database"));
}
