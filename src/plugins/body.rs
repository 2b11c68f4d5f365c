//! Long-form body normalization
//!
//! Multi-line or markdown text passed inline through a body flag is moved
//! into a temporary file and referenced through the tool's file flag
//! instead, so the text reaches the tool byte-for-byte.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Markdown heading at the start of any line
static HEADING_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s").unwrap());

/// A flag that carries free-form text, and the flag that reads it from a file
#[derive(Debug, Clone, Copy)]
pub struct BodyFlag {
    pub long: &'static str,
    pub short: &'static str,
    pub file_flag: &'static str,
}

/// Temporary file holding a normalized body
///
/// Dropping it deletes the file. `persist` keeps the file on disk and
/// hands ownership of its deletion to the caller.
#[derive(Debug)]
pub struct BodyFile {
    path: TempPath,
}

impl BodyFile {
    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file on disk past this value's lifetime
    pub fn persist(self) -> Option<PathBuf> {
        match self.path.keep() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to keep body file: {}", e);
                None
            }
        }
    }
}

/// Whether a body value should be moved into a file
pub fn needs_file(value: &str) -> bool {
    value.contains('\n')
        || value.contains("\\n")
        || value.contains("```")
        || HEADING_PATTERN.is_match(value)
}

/// Replace literal two-character `\n` sequences with real newlines
pub fn unescape_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}

/// Rewrite the first body flag in `argv` into a file flag when its value needs it
///
/// Handles both `--body value` / `-b value` and `--body=value`. Returns the
/// created file, which must outlive the subprocess.
pub fn normalize(argv: &mut Vec<String>, flag: &BodyFlag) -> Option<BodyFile> {
    let inline_prefix = format!("{}=", flag.long);

    let (index, value, width) = argv.iter().enumerate().skip(1).find_map(|(i, arg)| {
        if arg == flag.long || arg == flag.short {
            argv.get(i + 1).map(|v| (i, v.clone(), 2))
        } else {
            arg.strip_prefix(&inline_prefix).map(|v| (i, v.to_string(), 1))
        }
    })?;

    if !needs_file(&value) {
        return None;
    }

    let body = match write_body(&unescape_newlines(&value)) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to create body file, passing body inline: {}", e);
            return None;
        }
    };

    debug!("Moved {} value into {:?}", flag.long, body.path());
    argv.splice(
        index..index + width,
        [
            flag.file_flag.to_string(),
            body.path().to_string_lossy().to_string(),
        ],
    );

    Some(body)
}

fn write_body(text: &str) -> std::io::Result<BodyFile> {
    let mut file = tempfile::Builder::new()
        .prefix("smcp-body-")
        .suffix(".md")
        .tempfile()?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    Ok(BodyFile {
        path: file.into_temp_path(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const GH_BODY: BodyFlag = BodyFlag {
        long: "--body",
        short: "-b",
        file_flag: "--body-file",
    };

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_needs_file() {
        assert!(needs_file("Line 1\nLine 2"));
        assert!(needs_file("Line 1\\nLine 2"));
        assert!(needs_file("```rust\nfn main() {}\n```"));
        assert!(needs_file("## Summary"));
        assert!(!needs_file("Fixes the login bug"));
        assert!(!needs_file("Issue #42 is fixed"));
    }

    #[test]
    fn test_unescape_newlines_is_unconditional() {
        assert_eq!(unescape_newlines("a\\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn test_plain_body_untouched() {
        let mut args = argv(&["gh", "pr", "create", "--body", "Short body"]);
        let original = args.clone();
        assert!(normalize(&mut args, &GH_BODY).is_none());
        assert_eq!(args, original);
    }

    #[test]
    fn test_multiline_body_moved_to_file() {
        let mut args = argv(&["gh", "pr", "create", "--body", "Line 1\nLine 2", "--draft"]);
        let file = normalize(&mut args, &GH_BODY).unwrap();

        assert_eq!(args.len(), 6);
        assert_eq!(args[3], "--body-file");
        assert_eq!(args[4], file.path().to_string_lossy());
        assert_eq!(args[5], "--draft");
        assert!(!args.contains(&"--body".to_string()));
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "Line 1\nLine 2");
    }

    #[test]
    fn test_short_flag_with_escaped_newlines() {
        let mut args = argv(&["gh", "issue", "create", "-b", "First\\nSecond"]);
        let file = normalize(&mut args, &GH_BODY).unwrap();

        assert_eq!(args[3], "--body-file");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "First\nSecond");
    }

    #[test]
    fn test_inline_equals_form() {
        let mut args = argv(&["gh", "pr", "comment", "--body=# Title\ntext"]);
        let file = normalize(&mut args, &GH_BODY).unwrap();

        assert_eq!(args.len(), 5);
        assert_eq!(args[3], "--body-file");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "# Title\ntext");
    }

    #[test]
    fn test_only_first_occurrence_normalized() {
        let mut args = argv(&["gh", "pr", "create", "--body", "a\nb", "--body", "c\nd"]);
        let _file = normalize(&mut args, &GH_BODY).unwrap();
        assert_eq!(args.iter().filter(|a| *a == "--body-file").count(), 1);
        assert_eq!(args.iter().filter(|a| *a == "--body").count(), 1);
    }

    #[test]
    fn test_flag_without_value_ignored() {
        let mut args = argv(&["gh", "pr", "create", "--body"]);
        assert!(normalize(&mut args, &GH_BODY).is_none());
    }

    #[test]
    fn test_file_suffix_and_cleanup() {
        let mut args = argv(&["gh", "pr", "create", "--body", "a\nb"]);
        let file = normalize(&mut args, &GH_BODY).unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_persist_keeps_file() {
        let mut args = argv(&["gh", "pr", "create", "--body", "a\nb"]);
        let path = normalize(&mut args, &GH_BODY).unwrap().persist().unwrap();
        assert!(path.exists());
        fs::remove_file(path).unwrap();
    }
}
