use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const BIN: &str = "smcp-vcs";

/// Binary isolated from any user config
fn smcp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN).expect("binary should build");
    cmd.env("HOME", home.path())
        .env_remove("SMCP_VCS_TIMEOUT")
        .env_remove("SMCP_VCS_AUDIT_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn describe_gh() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home).args(["gh", "--describe"]).output().unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["plugin"]["name"], "gh");
    assert_eq!(json["plugin"]["version"], "1.0.0");
    assert_eq!(json["commands"][0]["name"], "run");
    assert_eq!(json["commands"][0]["parameters"][1]["name"], "subcommand");
}

#[test]
fn describe_git() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home).args(["git", "--describe"]).output().unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["plugin"]["name"], "git");
    assert_eq!(json["commands"][0]["parameters"][1]["name"], "args");
}

#[test]
fn dry_run_git() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home)
        .args(["git", "run", "--dry-run", "--command", "commit", "--args", "-m \"My commit message\""])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["success"], true);
    assert_eq!(json["command"], "git commit -m 'My commit message'");
    assert_eq!(
        json["cmd_args"],
        serde_json::json!(["git", "commit", "-m", "My commit message"])
    );
    assert_eq!(json["args_received"]["command"], "commit");
}

#[test]
fn dry_run_gh_request_json() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home)
        .args([
            "gh",
            "run",
            "--dry-run",
            "--non-interactive",
            "--request",
            r#"{"command": "repo", "subcommand": "delete o/r"}"#,
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["cmd_args"], serde_json::json!(["gh", "repo", "delete", "o/r", "--yes"]));
    assert_eq!(json["non_interactive"], true);
}

#[test]
fn dry_run_gh_body_file() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home)
        .args([
            "gh",
            "run",
            "--dry-run",
            "--command",
            "pr",
            "--subcommand",
            "create --title Docs --body \"Line 1\\nLine 2\"",
        ])
        .output()
        .unwrap();

    let json = stdout_json(&output);
    let argv: Vec<String> = serde_json::from_value(json["cmd_args"].clone()).unwrap();
    let pos = argv.iter().position(|a| a == "--body-file").unwrap();
    let path = std::path::PathBuf::from(&argv[pos + 1]);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Line 1\nLine 2");
    std::fs::remove_file(path).unwrap();
}

#[test]
fn invalid_cwd() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home)
        .args(["git", "run", "--cwd", "/nonexistent/directory/12345", "--command", "status"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["error_code"], "INVALID_CWD");
    assert_eq!(json["command_context"]["cwd"], "/nonexistent/directory/12345");
}

#[test]
fn invalid_request_json() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home)
        .args(["gh", "run", "--request", "{not json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request:"));
}

#[test]
fn no_action_prints_usage() {
    let home = TempDir::new().unwrap();
    smcp(&home)
        .arg("gh")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn unknown_command() {
    let home = TempDir::new().unwrap();
    let output = smcp(&home).args(["git", "frobnicate"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["error"], "Unknown command: frobnicate");
}

#[test]
fn unknown_tool_rejected() {
    let home = TempDir::new().unwrap();
    smcp(&home)
        .arg("svn")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("invalid value"));
}
