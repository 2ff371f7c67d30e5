//! Integration tests for core CLI contract behavior.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("lpcflash")
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lpcflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn short_help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("lpcflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lpcflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn flash_help_documents_policy_flags() {
    let mut cmd = cli_cmd();
    cmd.args(["flash", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--wipe"))
        .stdout(predicate::str::contains("--verify"))
        .stdout(predicate::str::contains("--no-start"));
}

#[test]
fn flash_missing_file_fails_before_touching_serial() {
    let mut cmd = cli_cmd();
    cmd.args(["--port", "/dev/null", "flash", "no-such-file.hex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn flash_malformed_hex_fails_with_parse_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.hex");
    fs::write(&path, ":04000000zzzz\n").expect("write hex");

    let mut cmd = cli_cmd();
    cmd.args(["--port", "/dev/null", "flash"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn flash_empty_binary_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.bin");
    fs::write(&path, b"").expect("write bin");

    let mut cmd = cli_cmd();
    cmd.args(["--port", "/dev/null", "flash", "--bin"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no data"));
}

#[test]
fn offset_requires_bin_flag() {
    let mut cmd = cli_cmd();
    cmd.args(["flash", "--offset", "0x1000", "firmware.hex"])
        .assert()
        .failure();
}

#[test]
fn control_swap_requires_control() {
    let mut cmd = cli_cmd();
    cmd.args(["--control-swap", "detect"]).assert().failure();
}

#[test]
fn invalid_baud_is_a_usage_error() {
    let mut cmd = cli_cmd();
    cmd.args(["--baud", "fast", "list-ports"]).assert().failure();
}

#[test]
fn list_ports_exits_zero() {
    let mut cmd = cli_cmd();
    cmd.arg("list-ports").assert().success();
}

#[test]
fn completions_bash_writes_script_to_stdout() {
    let mut cmd = cli_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}
