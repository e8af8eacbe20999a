//! Integration tests for command-line validation
//!
//! These run the real binary and only exercise paths that fail before any
//! connection to a broker is attempted.

use assert_cmd::Command;
use predicates::prelude::*;

fn kafka_tail() -> Command {
    let mut cmd = Command::cargo_bin("kafka-tail").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    kafka_tail()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--bootstrap-server"))
        .stdout(predicate::str::contains("--ce-type-filters"))
        .stdout(predicate::str::contains("--ssl-key-file"));
}

#[test]
fn test_missing_topic_and_key_file_are_reported_together() {
    kafka_tail()
        .args([
            "--bootstrap-server",
            "127.0.0.1",
            "--ca-crt-file",
            "ca.crt",
            "--client-crt-file",
            "client.crt",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("flag --topic was not set"))
        .stderr(predicate::str::contains("flag --ssl-key-file was not set"))
        .stderr(predicate::str::contains("Starting kafka consumer").not());
}

#[test]
fn test_no_flags_reports_every_required_flag() {
    kafka_tail()
        .assert()
        .failure()
        .stderr(predicate::str::contains("flag --bootstrap-server was not set"))
        .stderr(predicate::str::contains("flag --ssl-key-file was not set"))
        .stderr(predicate::str::contains("flag --ca-crt-file was not set"))
        .stderr(predicate::str::contains("flag --client-crt-file was not set"))
        .stderr(predicate::str::contains("flag --topic was not set"))
        .stderr(predicate::str::contains("--help"));
}

#[test]
fn test_invalid_type_filter_refuses_to_start() {
    kafka_tail()
        .args([
            "--bootstrap-server",
            "127.0.0.1",
            "--topic",
            "orders",
            "--ssl-key-file",
            "client.key",
            "--ca-crt-file",
            "ca.crt",
            "--client-crt-file",
            "client.crt",
            "--ce-mode",
            "--ce-type-filters",
            "order.created,(unclosed",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ce-type-filters"))
        .stderr(predicate::str::contains("(unclosed"))
        .stderr(predicate::str::contains("Starting kafka consumer").not());
}

#[test]
fn test_invalid_offset_reset_is_a_usage_error() {
    kafka_tail()
        .args(["--offset-reset", "middle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("middle"));
}

#[test]
fn test_invalid_filter_for_other_mode_refuses_to_start() {
    kafka_tail()
        .args([
            "--bootstrap-server",
            "127.0.0.1",
            "--topic",
            "orders",
            "--ssl-key-file",
            "client.key",
            "--ca-crt-file",
            "ca.crt",
            "--client-crt-file",
            "client.crt",
            "--ce-type-filters",
            "(unclosed",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to parse flag --ce-type-filters"))
        .stderr(predicate::str::contains("Starting kafka consumer").not());
}
