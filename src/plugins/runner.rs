//! Run orchestration
//!
//! Ties tokenization, body normalization, execution and classification
//! together and shapes the response. Every failure is turned into a
//! structured response; nothing escapes `run`.

use super::body::{self, BodyFile};
use super::builtin::{ToolSpec, GH, GIT};
use super::classify::{analyze_error, check_idempotency, HintContext};
use super::executor::{CommandExecutor, ProcessExecutor, ProcessOutput};
use super::protocol::{CommandContext, CommandRequest, PluginDescription, RunOptions, RunResponse};
use super::tokenizer::{build_argv, ensure_confirm_flag, render_command};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result text when a successful command prints nothing
pub const EMPTY_SUCCESS: &str = "Command completed successfully";

/// Error text when a failed command prints nothing
pub const EMPTY_FAILURE: &str = "Command produced no output and returned a non-zero exit code";

/// Default bound on a single invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A wrapped tool with its execution settings
pub struct Plugin {
    spec: &'static ToolSpec,
    timeout: Duration,
}

impl Plugin {
    /// The GitHub CLI plugin
    pub fn gh() -> Self {
        Self::new(&GH)
    }

    /// The git plugin
    pub fn git() -> Self {
        Self::new(&GIT)
    }

    /// Plugin for a tool spec with the default timeout
    pub fn new(spec: &'static ToolSpec) -> Self {
        Self {
            spec,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the execution timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name of the wrapped executable
    pub fn name(&self) -> &'static str {
        self.spec.program
    }

    /// Static metadata
    pub fn describe(&self) -> PluginDescription {
        self.spec.describe()
    }

    /// Build the argument vector and any body file for a request
    pub fn prepare(&self, request: &CommandRequest, non_interactive: bool) -> (Vec<String>, Option<BodyFile>) {
        let mut argv = build_argv(
            self.spec.program,
            &request.command,
            self.spec.secondary.select(request),
        );

        let body_file = self
            .spec
            .body_flag
            .as_ref()
            .and_then(|flag| body::normalize(&mut argv, flag));

        if non_interactive {
            ensure_confirm_flag(&mut argv);
        }

        (argv, body_file)
    }

    /// Run a request against the real tool
    pub async fn run(&self, request: &CommandRequest, options: &RunOptions) -> RunResponse {
        self.run_with(&ProcessExecutor, request, options).await
    }

    /// Run a request through the given executor
    pub async fn run_with<E: CommandExecutor>(
        &self,
        executor: &E,
        request: &CommandRequest,
        options: &RunOptions,
    ) -> RunResponse {
        let started = Instant::now();
        let cwd_display = options.cwd.as_ref().map(|p| p.display().to_string());

        if let Some(cwd) = &options.cwd {
            if !cwd.is_dir() {
                debug!("Rejecting missing working directory {:?}", cwd);
                let mut response = RunResponse::error(
                    "INVALID_CWD",
                    "invalid_cwd",
                    format!("Working directory does not exist: {}", cwd.display()),
                );
                response.command_context = cwd_display.map(|cwd| CommandContext { cwd });
                return response;
            }
        }

        let (argv, body_file) = self.prepare(request, options.non_interactive);
        let command = render_command(&argv);

        if options.dry_run {
            // The body file is left on disk so the caller can inspect it;
            // deleting it is the caller's job.
            if let Some(file) = body_file {
                file.persist();
            }
            return RunResponse {
                success: Some(true),
                dry_run: Some(true),
                command: Some(command),
                cmd_args: Some(argv),
                args_received: Some(request.clone()),
                cwd: cwd_display,
                non_interactive: options.non_interactive.then_some(true),
                elapsed: Some(started.elapsed().as_secs_f64()),
                ..Default::default()
            };
        }

        info!("Running: {}", command);
        let outcome = executor
            .execute(&argv, options.cwd.as_deref(), self.timeout)
            .await;
        // Body file lifetime ends with the subprocess, whatever the outcome
        drop(body_file);

        let mut response = match outcome {
            Ok(output) => self.shape(output, &command, cwd_display.as_deref()),
            Err(e) => {
                debug!("{} failed: {}", command, e);
                let mut response = RunResponse::error(e.code(), e.kind(), e.to_string());
                response.command_context =
                    cwd_display.clone().map(|cwd| CommandContext { cwd });
                response
            }
        };

        response.command = Some(command);
        response.cwd = cwd_display;
        response.elapsed = Some(started.elapsed().as_secs_f64());
        response
    }

    /// Classify a finished process and build its response
    fn shape(&self, output: ProcessOutput, command: &str, cwd: Option<&str>) -> RunResponse {
        if output.return_code == 0 {
            let result = if output.stdout.is_empty() {
                EMPTY_SUCCESS.to_string()
            } else {
                output.stdout.clone()
            };
            return RunResponse {
                success: Some(true),
                return_code: Some(0),
                result: Some(result),
                stdout: Some(output.stdout),
                stderr: Some(output.stderr),
                ..Default::default()
            };
        }

        let text = output_text(&output);

        let verdict = check_idempotency(self.spec.idempotency, &output, command);
        if verdict.is_idempotent {
            info!("Treating exit code {} as success: {}", output.return_code, verdict.message);
            return RunResponse {
                success: Some(true),
                idempotent: Some(true),
                result: Some(text.unwrap_or_else(|| verdict.message.clone())),
                message: Some(verdict.message),
                return_code: Some(output.return_code),
                stdout: Some(output.stdout),
                stderr: Some(output.stderr),
                ..Default::default()
            };
        }

        let ctx = HintContext { command, cwd };
        let hints = analyze_error(self.spec.hints, &output, &ctx);

        let (result, error) = match text {
            Some(text) => (Some(text), None),
            None => (None, Some(EMPTY_FAILURE.to_string())),
        };

        RunResponse {
            success: Some(false),
            return_code: Some(output.return_code),
            result,
            error,
            error_hints: hints,
            stdout: Some(output.stdout),
            stderr: Some(output.stderr),
            ..Default::default()
        }
    }
}

/// stdout, stderr, or both joined by a newline; `None` when both are empty
fn output_text(output: &ProcessOutput) -> Option<String> {
    match (output.stdout.is_empty(), output.stderr.is_empty()) {
        (true, true) => None,
        (false, true) => Some(output.stdout.clone()),
        (true, false) => Some(output.stderr.clone()),
        (false, false) => Some(format!("{}\n{}", output.stdout, output.stderr)),
    }
}
