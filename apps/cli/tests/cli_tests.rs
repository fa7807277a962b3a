//! CLI 端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cli() -> Command {
    Command::cargo_bin("dxl-arm-cli").unwrap()
}

#[test]
fn test_fk_zero_pose() {
    cli()
        .args(["fk", "0", "0", "0", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("286.000"));
}

#[test]
fn test_fk_negative_angles() {
    cli()
        .args(["fk", "0", "-90", "0", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("236.000"));
}

#[test]
fn test_ik_json() {
    cli()
        .args(["ik", "93", "0", "143", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"raw_targets\""))
        .stdout(predicate::str::contains("1024"));
}

#[test]
fn test_ik_unreachable_fails() {
    cli().args(["ik", "500", "0", "50"]).assert().failure();
}

#[test]
fn test_sweep_simulated() {
    cli()
        .args(["sweep", "--joint", "2", "--low", "400", "--high", "500", "--cycles", "2"])
        .args(["--step", "200", "--poll-ms", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/2]"));
}

#[test]
fn test_config_check() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[motion]\nmoving_threshold = 10").unwrap();

    cli()
        .args(["config", "check"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("阈值 10"));
}

#[test]
fn test_config_check_rejects_invalid() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "initial_speed = 5000").unwrap();

    cli().args(["config", "check"]).arg(file.path()).assert().failure();
}
