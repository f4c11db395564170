//! Common utilities for Claude Code hooks.
//!
//! This crate provides shared functionality for all Rust-based hooks:
//! - JSON input parsing with a deadline-bounded stdin read
//! - State file management
//! - Background subprocess spawning

pub mod input;
pub mod state;
pub mod subprocess;

pub use input::{HookInput, MutationClass, ToolInput};
pub use state::StateManager;
pub use subprocess::{command_exists, spawn_detached};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::input::{HookInput, MutationClass, ToolInput};
    pub use crate::state::StateManager;
    pub use anyhow::{Context, Result};
    pub use serde::{Deserialize, Serialize};
}
