//! smcp-vcs - GitHub CLI and git plugins
//!
//! Wraps `gh` and `git` behind a JSON request/response interface with
//! quoting-aware argument reconstruction, long-form body handling,
//! idempotency detection and failure hints.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugins;
