use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizlink(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("quizlink").unwrap();
    cmd.env("QUIZLINK_DATA_DIR", data_dir.path())
        .env_remove("QUIZLINK_LOOKUP_URL")
        .env_remove("QUIZLINK_LOOKUP_KEY");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("quizlink").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Short-link and deep-link resolution"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("quizlink").unwrap();
    cmd.arg("serve").arg("--help").assert().success().stdout(predicate::str::contains("port"));
}

#[test]
fn test_normalize_deep_link() {
    let dir = TempDir::new().unwrap();
    quizlink(&dir)
        .args(["normalize", "dhi", "--query", "key=K1&doctor=D1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redirect /quiz?type=DHI&key=K1&doctor=D1&mode=single"));
}

#[test]
fn test_normalize_without_signal_prints_start_url() {
    let dir = TempDir::new().unwrap();
    quizlink(&dir)
        .args(["normalize", "dhi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start /quiz?type=DHI&mode=single"));
}

#[test]
fn test_normalize_unknown_quiz_fails() {
    let dir = TempDir::new().unwrap();
    quizlink(&dir).args(["normalize", "bogus"]).assert().failure();
}

#[test]
fn test_resolve_without_lookup_config_is_not_found() {
    let dir = TempDir::new().unwrap();
    quizlink(&dir)
        .args(["resolve", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/404"));
}

#[test]
fn test_bootstrap_persists_session_for_later_commands() {
    let dir = TempDir::new().unwrap();
    quizlink(&dir)
        .args(["bootstrap", "/assessment/dhi?key=K1&doctor=D1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/quiz?type=DHI&key=K1&doctor=D1&mode=single"));

    quizlink(&dir)
        .args(["session", "set", "currentStep", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quizlink:dhi:D1:K1:currentStep"));

    quizlink(&dir)
        .args(["session", "get", "activeSession"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quizType\": \"DHI\""));
}
