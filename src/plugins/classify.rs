//! Outcome classification for failed invocations
//!
//! Two ordered rule tables are evaluated top to bottom, first match wins:
//! idempotency rules decide whether a nonzero exit means the desired state
//! already holds, and hint rules attach advisory remediation to genuine
//! failures. The tables themselves are tool-specific and live with each
//! plugin.

use super::executor::ProcessOutput;
use super::protocol::{ErrorHints, HintKind};
use regex::Regex;

/// Recognized "already done" phrase
pub struct IdempotencyRule {
    pub pattern: Regex,
    pub message: &'static str,
}

impl IdempotencyRule {
    /// Case-insensitive rule from a regex fragment
    pub fn new(pattern: &str, message: &'static str) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            message,
        }
    }
}

/// Context available to hint suggestion builders
#[derive(Debug, Clone, Copy)]
pub struct HintContext<'a> {
    pub command: &'a str,
    pub cwd: Option<&'a str>,
}

/// Known failure signature and how to remedy it
pub struct HintRule {
    pub kind: HintKind,
    pub pattern: Regex,
    pub suggestions: fn(&HintContext) -> Vec<String>,
}

impl HintRule {
    /// Case-insensitive rule from a regex fragment
    pub fn new(kind: HintKind, pattern: &str, suggestions: fn(&HintContext) -> Vec<String>) -> Self {
        Self {
            kind,
            pattern: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            suggestions,
        }
    }
}

/// Whether a failure is really "already done"
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyVerdict {
    pub is_idempotent: bool,
    pub message: String,
}

/// Check a failed invocation's combined output against the idempotency rules
pub fn check_idempotency(
    rules: &[IdempotencyRule],
    output: &ProcessOutput,
    command: &str,
) -> IdempotencyVerdict {
    let text = output.combined();
    match rules.iter().find(|rule| rule.pattern.is_match(&text)) {
        Some(rule) => IdempotencyVerdict {
            is_idempotent: true,
            message: format!("{} ({})", rule.message, command),
        },
        None => IdempotencyVerdict {
            is_idempotent: false,
            message: String::new(),
        },
    }
}

/// Classify a genuine failure
///
/// Scans stderr, falling back to stdout when stderr is empty. Returns
/// `None` when there is nothing to scan or no rule matches.
pub fn analyze_error(
    rules: &[HintRule],
    output: &ProcessOutput,
    ctx: &HintContext,
) -> Option<ErrorHints> {
    let text = if output.stderr.trim().is_empty() {
        output.stdout.as_str()
    } else {
        output.stderr.as_str()
    };
    if text.trim().is_empty() {
        return None;
    }

    rules
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map(|rule| ErrorHints {
            error_type: rule.kind,
            suggestions: (rule.suggestions)(ctx),
        })
}

/// Suggestions for running outside a repository
pub fn not_a_repository_suggestions(ctx: &HintContext) -> Vec<String> {
    match ctx.cwd {
        Some(cwd) => vec![
            format!("The working directory '{}' is not inside a git repository", cwd),
            "Point cwd at the root of a cloned repository".to_string(),
        ],
        None => vec![
            "No working directory was supplied and the current directory is not a git repository"
                .to_string(),
            "Pass cwd with the path of a cloned repository".to_string(),
        ],
    }
}
