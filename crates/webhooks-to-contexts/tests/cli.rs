//! End-to-end tests for the `webhooks-to-contexts` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use github_webhook_capabilities::{WORKFLOW_TRIGGERS, webhook_key};
use serde_json::{Value, json};

/// Builds an OpenAPI document with one (shared, `$ref`-linked) payload
/// schema per webhook key the classifier requires.
fn synthesized_document() -> Value {
    let mut schemas = serde_json::Map::new();
    schemas.insert(
        "common".into(),
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string"},
                "number": {"type": "integer"},
            },
        }),
    );

    for (event, subevents) in WORKFLOW_TRIGGERS {
        let keys = if subevents.is_empty() {
            vec![webhook_key(event, None)]
        } else {
            subevents
                .iter()
                .map(|&subevent| webhook_key(event, Some(subevent)))
                .collect()
        };

        for key in keys {
            schemas.insert(key, json!({"$ref": "#/components/schemas/common"}));
        }
    }

    json!({"components": {"schemas": schemas}})
}

fn write_fixture(name: &str, contents: &[u8]) -> PathBuf {
    let path = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_end_to_end() {
    let input = write_fixture(
        "webhooks.json",
        &serde_json::to_vec(&synthesized_document()).unwrap(),
    );
    let known_safe = write_fixture(
        "known-safe.txt",
        b"# vetted by hand\n\ngithub.event.number\nrunner.os\n",
    );

    Command::cargo_bin("webhooks-to-contexts")
        .unwrap()
        .args(["--input", input.to_str().unwrap()])
        .args(["--known-safe", known_safe.to_str().unwrap()])
        .args(["--output", "-", "--quiet"])
        .assert()
        .success()
        .stdout(
            "github.event.action,arbitrary\n\
             github.event.number,fixed\n\
             runner.os,fixed\n",
        );
}

#[test]
fn test_malformed_schema_aborts() {
    let input = write_fixture(
        "malformed.json",
        br#"{"components": {"schemas": {"webhook-push": {"type": "array", "items": {}}}}}"#,
    );
    let known_safe = write_fixture("known-safe-malformed.txt", b"");

    let assert = Command::cargo_bin("webhooks-to-contexts")
        .unwrap()
        .args(["--input", input.to_str().unwrap()])
        .args(["--known-safe", known_safe.to_str().unwrap()])
        .args(["--output", "-", "--quiet"])
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(
        stderr.contains("couldn't parse schema webhook-push"),
        "{stderr}"
    );
}

#[test]
fn test_missing_schema_aborts() {
    // A document that parses fine but doesn't cover every required
    // trigger event must fail rather than emit a partial mapping.
    let input = write_fixture(
        "incomplete.json",
        br#"{"components": {"schemas": {"webhook-push": {"type": "object"}}}}"#,
    );
    let known_safe = write_fixture("known-safe-incomplete.txt", b"");

    let assert = Command::cargo_bin("webhooks-to-contexts")
        .unwrap()
        .args(["--input", input.to_str().unwrap()])
        .args(["--known-safe", known_safe.to_str().unwrap()])
        .args(["--output", "-", "--quiet"])
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("missing webhook schema"), "{stderr}");
}

#[test]
fn test_unreadable_input_aborts() {
    let known_safe = write_fixture("known-safe-unreadable.txt", b"");

    Command::cargo_bin("webhooks-to-contexts")
        .unwrap()
        .args(["--input", "does-not-exist.json"])
        .args(["--known-safe", known_safe.to_str().unwrap()])
        .args(["--output", "-", "--quiet"])
        .assert()
        .failure();
}
