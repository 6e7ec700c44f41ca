mod common;

use common::teeny;
use predicates::prelude::*;

#[test]
fn help_prints_usage_and_exits_zero() {
    teeny()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn list_targets_prints_supported_triples() {
    teeny()
        .arg("--list-targets")
        .assert()
        .success()
        .stdout("x86_64-linux\nx86_64-windows\n");
}

#[test]
fn host_info_prints_a_triple_or_fails_cleanly() {
    let output = teeny().arg("--host-info").output().unwrap();
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.trim().contains("x86_64-"), "stdout was: {stdout}");
    } else {
        assert_eq!(Some(1), output.status.code());
    }
}

#[test]
fn unknown_flag_is_a_user_error() {
    teeny().arg("--frobnicate").assert().code(1);
}

#[test]
fn missing_input_is_a_user_error() {
    teeny()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no input"));
}

#[test]
fn bad_target_triple_lists_supported_targets() {
    teeny()
        .args(["--target", "sparc-solaris", "--code", "PRINT 1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("x86_64-linux"));
}

#[test]
fn missing_input_file_is_a_user_error() {
    teeny()
        .args(["this_file_does_not_exist.teeny"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not read file"));
}
