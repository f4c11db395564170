//! PostToolUse hook: capture memory-area writes as persisted learnings.
//!
//! Fires after Write/Edit tool calls. When the target file lives under a
//! `/memory/` path, the changed text goes through novelty analysis and the
//! high-confidence fragments are persisted to the memoryd store.
//!
//! Any failure degrades to a no-op: this hook must never block the tool
//! call that triggered it, so main always exits 0.

use anyhow::Result;
use hook_common::prelude::*;
use hook_memory::{
    Extract, Learning, StoreClient, analyze, encryption_key, ensure_server, memory_root,
};
use std::time::Duration;

// Component tag for diagnostic lines on stderr.
const TAG: &str = "[post-tool-memory]";

// Path segment marking the managed memory area.
const MEMORY_MARKER: &str = "/memory/";

// Tag attached to every learning captured by this hook.
const MARKER_TAG: &str = "auto-memory";

// Fragments below this confidence are dropped.
const CONFIDENCE_THRESHOLD: f64 = 0.7;

// The caller enforces its own ~10s hook budget; reading stdin must never
// be the thing that exhausts it.
const STDIN_DEADLINE: Duration = Duration::from_millis(1000);

/// Run policy, defaulting to the constants above.
struct Config {
    stdin_deadline: Duration,
    confidence_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stdin_deadline: STDIN_DEADLINE,
            confidence_threshold: CONFIDENCE_THRESHOLD,
        }
    }
}

impl Config {
    /// Environment overrides, mostly for tests and tuning experiments.
    fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse::<u64>("POST_TOOL_MEMORY_STDIN_DEADLINE_MS") {
            config.stdin_deadline = Duration::from_millis(ms);
        }
        if let Some(threshold) = env_parse::<f64>("POST_TOOL_MEMORY_CONFIDENCE_THRESHOLD") {
            config.confidence_threshold = threshold.clamp(0.0, 1.0);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

fn main() {
    let config = Config::from_env();
    if let Err(err) = run(&config) {
        diag(format!("Error (non-fatal): {err:#}"));
    }
}

/// The capture-filter-persist pipeline.
///
/// Every early return is a clean no-op; every error is normalized by main
/// into a single diagnostic line. Either way the caller sees success.
fn run(config: &Config) -> Result<()> {
    let Some(input) = HookInput::from_stdin(config.stdin_deadline) else {
        return Ok(());
    };

    let Some(content) = extract_content(&input) else {
        return Ok(());
    };

    let signals: Vec<Extract> = analyze(content)
        .extracts
        .into_iter()
        .filter(|extract| extract.confidence >= config.confidence_threshold)
        .collect();
    if signals.is_empty() {
        return Ok(());
    }

    // Connection prerequisites, resolved lazily now that there is work.
    let Some(passphrase) = encryption_key()? else {
        diag("No encryption key, skipping");
        return Ok(());
    };
    let root = memory_root()?;
    let server = ensure_server(&passphrase, &root)?;
    let client = StoreClient::connect(&server.base_url)?;

    let persisted = persist_fragments(&client, &signals);
    if persisted > 0 {
        diag(format!("Persisted {persisted} learning(s)"));
    }

    let _ = client.close();
    Ok(())
}

/// Extract the changed text content from the hook input.
///
/// Write: tool_input.content
/// Edit: tool_input.new_string
///
/// Pure mapping: a non-memory path, an unrecognized tool, or an absent or
/// empty field is "no content", never a fault.
fn extract_content(input: &HookInput) -> Option<&str> {
    let file_path = input.tool_input.file_path.as_deref()?;
    if !file_path.contains(MEMORY_MARKER) {
        return None;
    }

    let text = match input.mutation_class()? {
        MutationClass::FullWrite => input.tool_input.content.as_deref()?,
        MutationClass::Replacement => input.tool_input.new_string.as_deref()?,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Persist each fragment independently; one failure never aborts the rest.
fn persist_fragments(client: &StoreClient, signals: &[Extract]) -> usize {
    let mut persisted = 0;
    for extract in signals {
        let learning = Learning::insight(extract.content.clone(), extract.confidence)
            .with_tag(MARKER_TAG)
            .with_tag(extract.signal.clone());

        match client.write("learning", &learning) {
            Ok(outcome) => match outcome.error {
                Some(reason) => diag(format!("Write rejected: {reason}")),
                None => persisted += 1,
            },
            Err(err) => diag(format!("Write failed: {err}")),
        }
    }
    persisted
}

fn diag(message: impl AsRef<str>) {
    eprintln!("{TAG} {}", message.as_ref());
}
