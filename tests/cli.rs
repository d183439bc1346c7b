//! End-to-end tests for the `junit-xray` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn write_config(dir: &std::path::Path, extra: &str) -> PathBuf {
    let path = dir.join("reporter.json");
    let json = format!(
        r#"{{"basePath": "{}", "outputFile": "out/results.xml", "suite": "web"{}}}"#,
        dir.display(),
        extra
    );
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_replay_writes_report_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    Command::cargo_bin("junit-xray")
        .unwrap()
        .arg("replay")
        .arg(fixture("session.jsonl"))
        .arg("--config")
        .arg(&config)
        .env("buildVersion", "9.9.9")
        .env("JIRA_PROJECT_KEY", "WEB")
        .assert()
        .success()
        .stdout(predicate::str::contains("results.xml"));

    let xml = std::fs::read_to_string(dir.path().join("out/results.xml")).unwrap();
    assert!(xml.contains("name=\"Chrome 120.0\" package=\"web\""));
    assert!(xml.contains("tests=\"2\" errors=\"0\" failures=\"1\" time=\"0.05\""));
    assert!(xml.contains(
        "<testcase requirements=\"XRAY-101\" name=\"accepts valid credentials\" time=\"0.042\" classname=\"LoginForm submit\"/>"
    ));
    assert!(xml.contains(
        "<testcase requirements=\"Not defined\" name=\"rejects empty password\" time=\"0.008\" classname=\"LoginForm v1_2 rules\">"
    ));
    assert!(xml.contains("<failure type=\"\">Expected &lt;button&gt; to be disabled &amp; hidden.</failure>"));

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["jiraProjectKey"], "WEB");
    assert_eq!(metadata["envProperties"]["buildVersion"], "9.9.9");
}

#[test]
fn test_replay_xray_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), r#", "xrayIdOnly": true"#);

    Command::cargo_bin("junit-xray")
        .unwrap()
        .args(["replay"])
        .arg(fixture("session.jsonl"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let xml = std::fs::read_to_string(dir.path().join("out/results.xml")).unwrap();
    assert!(xml.contains("XRAY-101"));
    assert!(!xml.contains("rejects empty password"));
}

#[test]
fn test_config_layers_over_global_settings() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join(".junit-xray")).unwrap();
    std::fs::write(
        home.path().join(".junit-xray/settings.json"),
        r#"{"suite": "global-pkg", "projectKey": "GLOB"}"#,
    )
    .unwrap();
    let config = work.path().join("reporter.json");
    std::fs::write(&config, format!(r#"{{"basePath": "{}"}}"#, work.path().display())).unwrap();

    Command::cargo_bin("junit-xray")
        .unwrap()
        .current_dir(work.path())
        .env("HOME", home.path())
        .env_remove("JIRA_PROJECT_KEY")
        .arg("replay")
        .arg(fixture("session.jsonl"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let xml = std::fs::read_to_string(work.path().join("test-results.xml")).unwrap();
    assert!(xml.contains("package=\"global-pkg\""));

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(work.path().join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["jiraProjectKey"], "GLOB");
}

#[test]
fn test_unreadable_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("junit-xray")
        .unwrap()
        .arg("replay")
        .arg(fixture("session.jsonl"))
        .arg("--config")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config("));
}

#[test]
fn test_invalid_event_fails() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("bad.jsonl");
    std::fs::write(&events, "{\"event\":\"runStart\"}\nnot json\n").unwrap();
    let config = write_config(dir.path(), "");

    Command::cargo_bin("junit-xray")
        .unwrap()
        .arg("replay")
        .arg(&events)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidEvent { line: 2"));
}

#[test]
fn test_usage_without_command() {
    Command::cargo_bin("junit-xray")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: junit-xray replay"));
}
