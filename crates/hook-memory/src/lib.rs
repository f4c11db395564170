//! Memory capture domain for Claude Code hooks.
//!
//! Provides:
//! - Novelty analysis over changed text
//! - The persisted learning schema
//! - Key/root resolution, store server lifecycle, and the store client

pub mod client;
pub mod keys;
pub mod learning;
pub mod novelty;
pub mod server;

pub use client::{StoreClient, StoreError, WriteOutcome};
pub use keys::{encryption_key, memory_root};
pub use learning::{Learning, LearningKind};
pub use novelty::{Analysis, Extract, analyze};
pub use server::{ServerHandle, ensure_server};
