//! Hook input parsing from stdin.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Main hook input structure received from Claude Code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookInput {
    /// The name of the tool being called (e.g., "Edit", "Write")
    #[serde(default)]
    pub tool_name: String,

    /// Tool-specific input parameters
    #[serde(default)]
    pub tool_input: ToolInput,

    /// Additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Tool input parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    /// File path for Edit/Write tools
    #[serde(default)]
    pub file_path: Option<String>,

    /// Full file content for the Write tool
    #[serde(default)]
    pub content: Option<String>,

    /// Replacement text for the Edit tool
    #[serde(default)]
    pub new_string: Option<String>,

    /// Additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Recognized file-mutation tool classes.
///
/// Unrecognized tool names map to no class at all, so callers treat them
/// as "nothing to do" rather than a decode fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationClass {
    /// Full-content write (`Write`): the whole new file body is in `content`
    FullWrite,
    /// In-place replacement (`Edit`): the inserted text is in `new_string`
    Replacement,
}

impl HookInput {
    /// Parse hook input from a raw JSON string.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let parsed: HookInput = serde_json::from_str(raw)?;
        Ok(parsed)
    }

    /// Read and parse hook input from stdin, giving up once `deadline`
    /// elapses.
    ///
    /// Returns `None` for empty or undecodable input - both are normal for
    /// a hook fed arbitrary tool events, not error conditions.
    pub fn from_stdin(deadline: Duration) -> Option<Self> {
        let raw = read_bounded(io::stdin(), deadline);
        if raw.is_empty() {
            return None;
        }
        Self::parse(&raw).ok()
    }

    /// Classify this event's tool into a mutation class.
    pub fn mutation_class(&self) -> Option<MutationClass> {
        match self.tool_name.as_str() {
            "Write" => Some(MutationClass::FullWrite),
            "Edit" => Some(MutationClass::Replacement),
            _ => None,
        }
    }

    /// Check if this is an Edit tool call.
    pub fn is_edit(&self) -> bool {
        self.tool_name == "Edit"
    }

    /// Check if this is a Write tool call.
    pub fn is_write(&self) -> bool {
        self.tool_name == "Write"
    }

    /// Get the file path if applicable.
    pub fn get_file_path(&self) -> Option<&str> {
        self.tool_input.file_path.as_deref()
    }
}

/// Accumulate everything `reader` produces until EOF or `deadline`,
/// whichever comes first, and return the trimmed text.
///
/// The reader runs on its own thread so a caller that never closes the
/// stream cannot stall the hook past its budget.
pub fn read_bounded(reader: impl Read + Send + 'static, deadline: Duration) -> String {
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let start = Instant::now();
    let mut data = Vec::new();
    loop {
        let remaining = deadline.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(chunk) => data.extend_from_slice(&chunk),
            // Disconnected is EOF; Timeout is the deadline firing.
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&data).trim().to_string()
}
