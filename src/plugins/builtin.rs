//! Built-in plugins
//!
//! The two wrapped tools share one design and differ only in the data
//! below: tool name, secondary request field, body flag, and the
//! classification tables.

use super::body::BodyFlag;
use super::classify::{not_a_repository_suggestions, HintRule, IdempotencyRule};
use super::protocol::{
    CommandDef, CommandRequest, FieldValue, HintKind, ParameterDef, PluginDescription, PluginInfo,
};
use once_cell::sync::Lazy;

/// Version reported by `describe`
pub const PLUGIN_VERSION: &str = "1.0.0";

/// Which request field follows `command`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryField {
    Subcommand,
    Args,
}

impl SecondaryField {
    /// Request key of this field
    pub fn name(&self) -> &'static str {
        match self {
            SecondaryField::Subcommand => "subcommand",
            SecondaryField::Args => "args",
        }
    }

    /// Pick this field out of a request
    pub fn select<'a>(&self, request: &'a CommandRequest) -> &'a FieldValue {
        match self {
            SecondaryField::Subcommand => &request.subcommand,
            SecondaryField::Args => &request.args,
        }
    }
}

/// Everything that distinguishes one wrapped tool from another
pub struct ToolSpec {
    /// Executable name, always `argv[0]`
    pub program: &'static str,
    pub description: &'static str,
    pub run_description: &'static str,
    pub command_help: &'static str,
    pub secondary: SecondaryField,
    pub secondary_help: &'static str,
    pub body_flag: Option<BodyFlag>,
    pub idempotency: &'static Lazy<Vec<IdempotencyRule>>,
    pub hints: &'static Lazy<Vec<HintRule>>,
}

impl ToolSpec {
    /// Static metadata for `describe`
    pub fn describe(&self) -> PluginDescription {
        PluginDescription {
            plugin: PluginInfo {
                name: self.program.to_string(),
                version: PLUGIN_VERSION.to_string(),
                description: self.description.to_string(),
            },
            commands: vec![CommandDef {
                name: "run".to_string(),
                description: self.run_description.to_string(),
                parameters: vec![
                    ParameterDef {
                        name: "command".to_string(),
                        param_type: "string".to_string(),
                        description: self.command_help.to_string(),
                        required: false,
                    },
                    ParameterDef {
                        name: self.secondary.name().to_string(),
                        param_type: "string".to_string(),
                        description: self.secondary_help.to_string(),
                        required: false,
                    },
                ],
            }],
        }
    }
}

/// GitHub CLI
pub static GH: ToolSpec = ToolSpec {
    program: "gh",
    description: "Run GitHub CLI commands with quoting-aware argument handling",
    run_description: "Run a gh command",
    command_help: "gh command to run, e.g. 'repo' or 'pr create --title \"Fix\"'",
    secondary: SecondaryField::Subcommand,
    secondary_help: "Subcommand and arguments appended after the command",
    body_flag: Some(BodyFlag {
        long: "--body",
        short: "-b",
        file_flag: "--body-file",
    }),
    idempotency: &GH_IDEMPOTENCY,
    hints: &GH_HINTS,
};

/// git
pub static GIT: ToolSpec = ToolSpec {
    program: "git",
    description: "Run git commands with quoting-aware argument handling",
    run_description: "Run a git command",
    command_help: "git command to run, e.g. 'status' or 'commit'",
    secondary: SecondaryField::Args,
    secondary_help: "Arguments appended after the command, as a string or a list",
    body_flag: None,
    idempotency: &GIT_IDEMPOTENCY,
    hints: &GIT_HINTS,
};

static GH_IDEMPOTENCY: Lazy<Vec<IdempotencyRule>> = Lazy::new(|| {
    vec![
        IdempotencyRule::new(r"already closed", "Already closed"),
        IdempotencyRule::new(r"already merged", "Already merged"),
        IdempotencyRule::new(r"already (open|reopened)", "Already open"),
        IdempotencyRule::new(r"already exists", "Already exists"),
        IdempotencyRule::new(r"already (a member|a collaborator|starred)", "Already applied"),
        IdempotencyRule::new(r"no changes to apply|nothing to update", "No changes to apply"),
    ]
});

static GIT_IDEMPOTENCY: Lazy<Vec<IdempotencyRule>> = Lazy::new(|| {
    vec![
        IdempotencyRule::new(r"already up[ -]to[ -]date", "Already up to date"),
        IdempotencyRule::new(r"nothing to commit", "Nothing to commit"),
        IdempotencyRule::new(r"already on '", "Already on the requested branch"),
        IdempotencyRule::new(r"already exists", "Already exists"),
        IdempotencyRule::new(r"no local changes to save|no changes to apply", "No changes to apply"),
    ]
});

static GH_HINTS: Lazy<Vec<HintRule>> = Lazy::new(|| {
    vec![
        HintRule::new(
            HintKind::NotARepository,
            r"not a git repository",
            not_a_repository_suggestions,
        ),
        HintRule::new(
            HintKind::UnresolvedReference,
            r"could not resolve to an? |unknown revision|no commit found",
            |_| {
                vec![
                    "Check that the branch, tag, pull request or issue number exists".to_string(),
                    "Pass --repo OWNER/REPO when outside the target repository".to_string(),
                ]
            },
        ),
        HintRule::new(
            HintKind::InvalidArguments,
            r"accepts (at most )?\d+ args?|requires at least \d+ args?|unknown (flag|shorthand flag|command)|invalid argument",
            |ctx| {
                vec![
                    format!("Check the argument count and flags of '{}'", ctx.command),
                    "Wrap values containing spaces in double quotes".to_string(),
                ]
            },
        ),
        HintRule::new(HintKind::NotFound, r"not found|http 404", |_| {
            vec![
                "Check the owner and repository name".to_string(),
                "Private resources require an account with access".to_string(),
            ]
        }),
        HintRule::new(
            HintKind::AuthenticationRequired,
            r"gh auth login|authentication required|not logged in|http 401|bad credentials",
            |_| {
                vec![
                    "Run 'gh auth login' or set GH_TOKEN".to_string(),
                    "Run 'gh auth status' to inspect the active account".to_string(),
                ]
            },
        ),
        HintRule::new(
            HintKind::PermissionDenied,
            r"permission denied|http 403|must have (admin|write|push) (rights|access)|resource not accessible",
            |_| {
                vec![
                    "The authenticated account lacks permission for this operation".to_string(),
                    "Run 'gh auth refresh -s <scope>' to add missing token scopes".to_string(),
                ]
            },
        ),
    ]
});

static GIT_HINTS: Lazy<Vec<HintRule>> = Lazy::new(|| {
    vec![
        HintRule::new(
            HintKind::NotARepository,
            r"not a git repository",
            not_a_repository_suggestions,
        ),
        HintRule::new(
            HintKind::UnresolvedReference,
            r"unknown revision|ambiguous argument|did not match any|not a valid (object name|ref)|couldn't find remote ref",
            |_| {
                vec![
                    "Check the branch, tag or commit name with 'git branch -a' or 'git log'".to_string(),
                    "Run 'git fetch' if the reference only exists on the remote".to_string(),
                ]
            },
        ),
        HintRule::new(
            HintKind::InvalidArguments,
            r"usage: git|wrong number of arguments|too many arguments|unknown option|requires a value",
            |ctx| {
                vec![
                    format!("Check the arguments of '{}'", ctx.command),
                    "Pass args as a list to keep values with spaces intact".to_string(),
                ]
            },
        ),
        HintRule::new(
            HintKind::NotFound,
            r"not found|does not exist|no such file or directory",
            |_| {
                vec![
                    "Check that the path, remote or repository exists".to_string(),
                ]
            },
        ),
        HintRule::new(
            HintKind::AuthenticationRequired,
            r"authentication failed|could not read username|terminal prompts disabled",
            |_| {
                vec![
                    "Configure a credential helper or use an SSH remote".to_string(),
                    "For GitHub remotes, run 'gh auth setup-git'".to_string(),
                ]
            },
        ),
        HintRule::new(
            HintKind::PermissionDenied,
            r"permission denied|access denied|403",
            |_| {
                vec![
                    "Check file permissions in the working tree".to_string(),
                    "Check that the account has push access to the remote".to_string(),
                ]
            },
        ),
    ]
});
