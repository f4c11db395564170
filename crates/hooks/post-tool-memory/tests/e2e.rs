//! End-to-end scenarios for the post-tool-memory hook.
//!
//! Each test drives the real binary with a scripted environment. A minimal
//! in-process HTTP stub stands in for the memoryd daemon so the tests can
//! assert on the exact writes the hook issues.

use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

/// Scripted stand-in for memoryd.
///
/// Answers GET (health probes) with 200, answers each POST with the next
/// scripted body, and captures POST bodies for assertions.
struct StubStore {
    base_url: String,
    bodies: mpsc::Receiver<String>,
}

impl StubStore {
    fn spawn(write_responses: Vec<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let mut responses: VecDeque<&str> = write_responses.into();
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some((request_line, body)) = read_request(&mut stream) else {
                    continue;
                };
                let payload = if request_line.starts_with("POST") {
                    let _ = tx.send(body);
                    responses.pop_front().unwrap_or("{}")
                } else {
                    r#"{"status":"ok"}"#
                };
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { base_url, bodies: rx }
    }

    fn captured_bodies(&self) -> Vec<String> {
        self.bodies.try_iter().collect()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        if raw.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let text = String::from_utf8_lossy(&raw).to_string();
    let (head, tail) = text.split_once("\r\n\r\n")?;
    let request_line = head.lines().next()?.to_string();
    let content_length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    let mut body = tail.as_bytes().to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some((request_line, String::from_utf8_lossy(&body).to_string()))
}

/// An address nothing listens on; connecting to it fails immediately.
fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// The hook binary with a scrubbed memoryd environment.
fn hook() -> Command {
    let mut cmd = Command::cargo_bin("post-tool-memory").unwrap();
    for var in [
        "MEMORYD_KEY",
        "MEMORYD_KEY_FILE",
        "MEMORYD_ROOT",
        "MEMORYD_URL",
        "MEMORYD_BIN",
        "POST_TOOL_MEMORY_STDIN_DEADLINE_MS",
        "POST_TOOL_MEMORY_CONFIDENCE_THRESHOLD",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_event(file_path: &str, content: &str) -> String {
    serde_json::json!({
        "tool_name": "Write",
        "tool_input": { "file_path": file_path, "content": content }
    })
    .to_string()
}

#[test]
fn empty_stdin_is_a_clean_noop() {
    hook()
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn malformed_input_is_a_clean_noop() {
    hook()
        .write_stdin("this is {not json")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn path_outside_memory_area_is_ignored() {
    // An unreachable store URL proves no connection is ever attempted: a
    // connection attempt would surface as a non-fatal diagnostic.
    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", refused_url())
        .write_stdin(write_event(
            "/home/u/docs/notes.md",
            "Decided to use sqlite for the cache layer.",
        ))
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn low_confidence_fragments_never_reach_the_store() {
    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", refused_url())
        .write_stdin(write_event(
            "/home/u/memory/notes.md",
            "followup: revisit the eviction policy",
        ))
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn missing_key_skips_before_any_connection() {
    hook()
        .env("MEMORYD_KEY_FILE", "/nonexistent/memoryd/key")
        .env("MEMORYD_URL", refused_url())
        .write_stdin(write_event(
            "/home/u/memory/notes.md",
            "Decided to use sqlite for the cache layer.",
        ))
        .assert()
        .success()
        .stderr(
            predicate::str::contains("No encryption key, skipping")
                .and(predicate::str::contains("Error").not()),
        );
}

#[test]
fn unreachable_store_degrades_to_a_nonfatal_diagnostic() {
    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", refused_url())
        .write_stdin(write_event(
            "/home/u/memory/notes.md",
            "Decided to use sqlite for the cache layer.",
        ))
        .assert()
        .success()
        .stderr(predicate::str::contains("Error (non-fatal)"));
}

#[test]
fn write_event_persists_one_learning() {
    let stub = StubStore::spawn(vec!["{}"]);

    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", stub.base_url.clone())
        .write_stdin(write_event(
            "/home/u/memory/notes.md",
            "Decided to use sqlite for the cache layer.",
        ))
        .assert()
        .success()
        .stderr(predicate::str::contains("Persisted 1 learning(s)"));

    let bodies = stub.captured_bodies();
    assert_eq!(bodies.len(), 1);

    let record: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(record["type"], "insight");
    assert_eq!(record["content"], "Decided to use sqlite for the cache layer.");
    let tags: Vec<&str> = record["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["auto-memory", "decision"]);
}

#[test]
fn edit_event_persists_the_replacement_text() {
    let stub = StubStore::spawn(vec!["{}"]);

    let event = serde_json::json!({
        "tool_name": "Edit",
        "tool_input": {
            "file_path": "/home/u/memory/notes.md",
            "old_string": "stale line",
            "new_string": "Turns out the cache invalidation ran before the index rebuild."
        }
    });

    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", stub.base_url.clone())
        .write_stdin(event.to_string())
        .assert()
        .success()
        .stderr(predicate::str::contains("Persisted 1 learning(s)"));

    let bodies = stub.captured_bodies();
    assert_eq!(bodies.len(), 1);
    let record: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(record["tags"][1], "insight");
}

#[test]
fn rejected_write_does_not_abort_the_remaining_fragments() {
    let stub = StubStore::spawn(vec![r#"{"error":"duplicate"}"#, "{}"]);

    let content = "Decided to use sqlite for the cache layer.\n\
                   Turns out the cache invalidation ran before the index rebuild.";

    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", stub.base_url.clone())
        .write_stdin(write_event("/home/u/memory/notes.md", content))
        .assert()
        .success()
        .stderr(
            predicate::str::contains("Write rejected: duplicate")
                .and(predicate::str::contains("Persisted 1 learning(s)")),
        );

    // Both fragments were attempted despite the first rejection.
    assert_eq!(stub.captured_bodies().len(), 2);
}

#[test]
fn key_file_fallback_feeds_the_pipeline() {
    let stub = StubStore::spawn(vec!["{}"]);
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("key");
    std::fs::write(&key_path, "file-passphrase\n").unwrap();

    hook()
        .env("MEMORYD_KEY_FILE", key_path)
        .env("MEMORYD_URL", stub.base_url.clone())
        .write_stdin(write_event(
            "/home/u/memory/notes.md",
            "Decided to use sqlite for the cache layer.",
        ))
        .assert()
        .success()
        .stderr(predicate::str::contains("Persisted 1 learning(s)"));

    assert_eq!(stub.captured_bodies().len(), 1);
}

#[test]
fn threshold_override_can_widen_the_filter() {
    let stub = StubStore::spawn(vec!["{}"]);

    hook()
        .env("MEMORYD_KEY", "test-passphrase")
        .env("MEMORYD_URL", stub.base_url.clone())
        .env("POST_TOOL_MEMORY_CONFIDENCE_THRESHOLD", "0.3")
        .write_stdin(write_event(
            "/home/u/memory/notes.md",
            "followup: revisit the eviction policy",
        ))
        .assert()
        .success()
        .stderr(predicate::str::contains("Persisted 1 learning(s)"));

    let bodies = stub.captured_bodies();
    assert_eq!(bodies.len(), 1);
    let record: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(record["tags"][1], "todo");
}
