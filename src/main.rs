//! smcp-vcs - GitHub CLI and git plugins
//!
//! Prints exactly one JSON document on stdout per invocation. Diagnostics
//! go to stderr.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use serde::Serialize;
use serde_json::json;
use smcp_vcs::cli::{Action, Args, RunArgs};
use smcp_vcs::config::Config;
use smcp_vcs::logging::AuditLogger;
use smcp_vcs::plugins::Plugin;
use std::time::Duration;
use tracing::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            e.print()?;
            std::process::exit(0);
        }
        Err(e) => {
            e.print()?;
            let rendered = e.render().to_string();
            let message = rendered.lines().next().unwrap_or_default();
            print_json(&json!({ "error": message.trim_start_matches("error: ") }))?;
            std::process::exit(1);
        }
    };

    init_logging(args.debug);

    debug!("Starting smcp-vcs v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Config::default()
        }
    };

    let code = dispatch(&args, &config).await?;
    std::process::exit(code);
}

/// Handle the parsed command line, returning the exit code
async fn dispatch(args: &Args, config: &Config) -> Result<i32> {
    let plugin = args.tool.plugin();

    if args.describe {
        print_json(&plugin.describe())?;
        return Ok(0);
    }

    match &args.action {
        Some(Action::Run(run)) => run_command(plugin, run, config).await,
        Some(Action::Unknown(words)) => {
            let name = words.first().map(String::as_str).unwrap_or_default();
            print_json(&json!({ "error": format!("Unknown command: {}", name) }))?;
            Ok(1)
        }
        None => {
            Args::command().print_help()?;
            Ok(1)
        }
    }
}

async fn run_command(plugin: Plugin, run: &RunArgs, config: &Config) -> Result<i32> {
    let request = match run.to_request() {
        Ok(request) => request,
        Err(e) => {
            print_json(&json!({ "error": format!("Invalid request: {}", e) }))?;
            return Ok(1);
        }
    };

    let timeout = run
        .timeout
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.timeout());
    let plugin = plugin.with_timeout(timeout);

    let options = run.options();
    let response = plugin.run(&request, &options).await;

    if config.audit.enabled {
        AuditLogger::new(config.audit.clone()).log_run(plugin.name(), &options, &response);
    }

    print_json(&response)?;
    Ok(if response.is_error() { 1 } else { 0 })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize the logging/tracing subsystem
fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
