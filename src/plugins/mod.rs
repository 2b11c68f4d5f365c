//! CLI wrapper plugins
//!
//! Each plugin wraps one external executable. A JSON request is turned
//! into an argument vector, executed, and the outcome is classified into
//! a JSON response.

pub mod body;
pub mod builtin;
pub mod classify;
pub mod executor;
pub mod protocol;
pub mod runner;
pub mod tokenizer;

pub use executor::{CommandExecutor, ProcessExecutor, ProcessOutput};
pub use protocol::{CommandRequest, FieldValue, PluginDescription, RunOptions, RunResponse};
pub use runner::Plugin;
