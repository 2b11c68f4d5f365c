//! Command-line argument parsing for smcp-vcs

use crate::plugins::protocol::{CommandRequest, RunOptions};
use crate::plugins::Plugin;
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::Error as _;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

/// smcp-vcs - GitHub CLI and git plugins
#[derive(Parser, Debug)]
#[command(name = "smcp-vcs")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Tool to wrap
    #[arg(value_enum, value_name = "TOOL")]
    pub tool: Tool,

    /// Print plugin metadata as JSON and exit
    #[arg(long)]
    pub describe: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub action: Option<Action>,
}

/// Wrapped executables
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// GitHub CLI
    Gh,
    /// git
    Git,
}

impl Tool {
    /// Plugin for this tool
    pub fn plugin(self) -> Plugin {
        match self {
            Tool::Gh => Plugin::gh(),
            Tool::Git => Plugin::git(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Run a command through the plugin
    Run(RunArgs),

    /// Anything else, reported as an unknown command
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Show the command without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Append --yes to skip confirmation prompts
    #[arg(long)]
    pub non_interactive: bool,

    /// Working directory for the command
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds, overrides the configured value
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Primary command, e.g. "repo" or "log --oneline"
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    pub command: Option<String>,

    /// Remaining gh arguments
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    pub subcommand: Option<String>,

    /// Remaining git arguments; consumes the rest of the line
    #[arg(long, value_name = "VALUE", num_args = 1.., allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Full request as a JSON object; explicit flags take precedence
    #[arg(long, value_name = "JSON")]
    pub request: Option<String>,
}

impl RunArgs {
    /// Build the request from `--request` and the individual flags
    ///
    /// Flags are written into the request object before parsing, so the
    /// echoed request shows what was actually passed.
    pub fn to_request(&self) -> Result<CommandRequest, serde_json::Error> {
        let mut received = match &self.request {
            Some(json) => serde_json::from_str(json)?,
            None => Value::Object(Map::new()),
        };
        let fields = received
            .as_object_mut()
            .ok_or_else(|| serde_json::Error::custom("request must be a JSON object"))?;

        if let Some(command) = &self.command {
            fields.insert("command".to_string(), json!(command));
        }
        if let Some(subcommand) = &self.subcommand {
            fields.insert("subcommand".to_string(), json!(subcommand));
        }
        match self.args.as_slice() {
            [] => {}
            [single] => {
                fields.insert("args".to_string(), json!(single));
            }
            many => {
                fields.insert("args".to_string(), json!(many));
            }
        }

        CommandRequest::from_json(received)
    }

    pub fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            non_interactive: self.non_interactive,
            cwd: self.cwd.clone(),
        }
    }
}
