//! Subprocess utilities for hooks that launch background helpers.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Check if a command exists in PATH.
pub fn command_exists(cmd: &str) -> bool {
    if cfg!(target_os = "windows") {
        Command::new("where")
            .arg(cmd)
            .output()
            .map_or(false, |o| o.status.success())
    } else {
        Command::new("which")
            .arg(cmd)
            .output()
            .map_or(false, |o| o.status.success())
    }
}

/// Spawn a long-lived background process with detached stdio.
///
/// The child outlives this process; the caller gets its pid and no other
/// handle.
pub fn spawn_detached(program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<u32> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for (key, value) in envs {
        command.env(key, value);
    }

    let child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;
    Ok(child.id())
}
