//! Command-line tokenization
//!
//! Turns request fields into a flat argument vector using POSIX shell
//! quoting, and renders an argument vector back into a command string.

use super::protocol::FieldValue;
use tracing::debug;

/// Confirm flags recognized when injecting `--yes`
const CONFIRM_FLAGS: &[&str] = &["--yes", "-y"];

impl FieldValue {
    /// Tokens this field contributes to the argument vector
    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            FieldValue::Absent => Vec::new(),
            FieldValue::Text(text) => split(text),
            FieldValue::Scalar(value) => vec![value.clone()],
            FieldValue::Tokens(items) => items.clone(),
        }
    }
}

/// Split free-form text with shell quoting rules
///
/// Quoted spans, including ones spanning several lines, become a single
/// token. `#` is an ordinary character, never a comment. Text with
/// unbalanced quotes falls back to whitespace splitting.
pub fn split(text: &str) -> Vec<String> {
    match shell_words::split(&escape_comment_marks(text)) {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!("Falling back to whitespace split for {:?}: {}", text, e);
            text.split_whitespace().map(str::to_string).collect()
        }
    }
}

/// Escape every unquoted `#` that starts a word
///
/// `shell_words` drops a word-initial `#` and the rest of the line as a
/// comment, which would lose issue numbers like `#42`.
fn escape_comment_marks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut single = false;
    let mut double = false;
    let mut word_start = true;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if !single => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
                word_start = false;
                continue;
            }
            '\'' if !double => single = !single,
            '"' if !single => double = !double,
            '#' if word_start && !single && !double => out.push('\\'),
            _ => {}
        }
        out.push(c);
        word_start = !single && !double && c.is_whitespace();
    }

    out
}

/// Build `[program, command..., rest...]`
pub fn build_argv(program: &str, command: &FieldValue, rest: &FieldValue) -> Vec<String> {
    let mut argv = vec![program.to_string()];
    argv.extend(command.to_tokens());
    argv.extend(rest.to_tokens());
    argv
}

/// Render an argument vector as a command string
///
/// Tokens that need quoting are quoted, so splitting the result yields
/// the same vector again.
pub fn render_command(argv: &[String]) -> String {
    shell_words::join(argv)
}

/// Append `--yes` unless a confirm flag is already present
pub fn ensure_confirm_flag(argv: &mut Vec<String>) {
    if argv.iter().any(|arg| CONFIRM_FLAGS.contains(&arg.as_str())) {
        return;
    }
    argv.push("--yes".to_string());
}
