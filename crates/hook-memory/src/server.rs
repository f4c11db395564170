//! Store server lifecycle.
//!
//! Ensures a reachable memoryd instance and hands back its address. The
//! daemon is shared across hook invocations; this module only makes it
//! reachable, it never stops it.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use fs2::FileExt;
use hook_common::{StateManager, command_exists, spawn_detached};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::thread;
use std::time::{Duration, Instant};

const URL_ENV: &str = "MEMORYD_URL";
const BIN_ENV: &str = "MEMORYD_BIN";
const DEFAULT_BIN: &str = "memoryd";
const DEFAULT_PORT: u16 = 48621;
const STATE_PREFIX: &str = "memoryd";
const STATE_KEY: &str = "server";

// A fresh daemon opens its listener well under a second; the poll budget
// leaves room for a cold start without eating the caller's overall budget.
const READY_TIMEOUT: Duration = Duration::from_secs(2);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);
const HEALTH_TIMEOUT: Duration = Duration::from_millis(300);

/// Handle to a reachable store server.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    pub base_url: String,
}

/// Server record shared across invocations via the state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerState {
    pid: u32,
    base_url: String,
}

/// Ensure a store server is running and return its address.
///
/// Resolution order: explicit MEMORYD_URL override, then the server
/// recorded in the state file, then a fresh spawn. The passphrase travels
/// to the child via its environment, never argv.
pub fn ensure_server(passphrase: &str, root: &Utf8Path) -> Result<ServerHandle> {
    if let Ok(url) = std::env::var(URL_ENV) {
        let base_url = normalize_base_url(&url);
        if !is_healthy(&base_url) {
            bail!("configured store server is unreachable: {base_url}");
        }
        return Ok(ServerHandle { base_url });
    }

    let state = StateManager::new(STATE_PREFIX);
    if let Some(recorded) = state.load::<ServerState>(STATE_KEY)? {
        if is_healthy(&recorded.base_url) {
            return Ok(ServerHandle {
                base_url: recorded.base_url,
            });
        }
        // Dead or replaced daemon; forget it and respawn.
        state.delete(STATE_KEY)?;
    }

    spawn_server(passphrase, root, &state)
}

/// Probe the server health endpoint.
pub fn is_healthy(base_url: &str) -> bool {
    let agent = ureq::builder()
        .timeout_connect(HEALTH_TIMEOUT)
        .timeout(HEALTH_TIMEOUT)
        .build();
    agent.get(&format!("{base_url}/health")).call().is_ok()
}

fn spawn_server(passphrase: &str, root: &Utf8Path, state: &StateManager) -> Result<ServerHandle> {
    // Concurrent hook invocations race to spawn; the lock file makes sure
    // only one of them does. Released when `lock` drops.
    let lock_path = state.state_path(STATE_KEY).with_extension("lock");
    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open spawn lock: {}", lock_path.display()))?;
    lock.lock_exclusive().context("Failed to take spawn lock")?;

    // Another invocation may have spawned while we waited on the lock.
    if let Some(recorded) = state.load::<ServerState>(STATE_KEY)? {
        if is_healthy(&recorded.base_url) {
            return Ok(ServerHandle {
                base_url: recorded.base_url,
            });
        }
    }

    let binary = std::env::var(BIN_ENV).unwrap_or_else(|_| DEFAULT_BIN.to_string());
    if !command_exists(&binary) {
        bail!("store server binary not found: {binary}");
    }

    let base_url = format!("http://127.0.0.1:{DEFAULT_PORT}");
    let port = DEFAULT_PORT.to_string();
    let pid = spawn_detached(
        &binary,
        &["serve", "--root", root.as_str(), "--port", &port],
        &[("MEMORYD_KEY", passphrase)],
    )?;

    wait_until_healthy(&base_url, READY_TIMEOUT)
        .with_context(|| format!("store server did not become ready at {base_url}"))?;

    state.save(
        STATE_KEY,
        &ServerState {
            pid,
            base_url: base_url.clone(),
        },
    )?;

    Ok(ServerHandle { base_url })
}

fn wait_until_healthy(base_url: &str, budget: Duration) -> Result<()> {
    let start = Instant::now();
    loop {
        if is_healthy(base_url) {
            return Ok(());
        }
        if start.elapsed() > budget {
            bail!("no healthy response within {budget:?}");
        }
        thread::sleep(READY_POLL_INTERVAL);
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
