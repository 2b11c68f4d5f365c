//! Plugin protocol definitions
//!
//! Defines the JSON request/response shapes shared by every plugin.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::path::PathBuf;

/// One field of a command request after its dynamic JSON shape is resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// Missing, null, or falsy (`""`, `[]`, `{}`, `false`, `0`)
    #[default]
    Absent,
    /// Free-form text, split with shell quoting rules
    Text(String),
    /// A non-string scalar, always a single token
    Scalar(String),
    /// Already tokenized input, used as-is
    Tokens(Vec<String>),
}

impl FieldValue {
    /// Whether the field contributes nothing
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Resolve an arbitrary JSON value
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => FieldValue::Absent,
            Value::String(s) if s.is_empty() => FieldValue::Absent,
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) if items.is_empty() => FieldValue::Absent,
            Value::Object(map) if map.is_empty() => FieldValue::Absent,
            Value::Array(items) => FieldValue::Tokens(items.into_iter().map(stringify).collect()),
            Value::Number(n) if n.as_f64() == Some(0.0) => FieldValue::Absent,
            other => FieldValue::Scalar(stringify(other)),
        }
    }

    /// Text from a CLI flag; empty text is absent
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::Text(s)
        }
    }

    /// Tokens from a CLI flag; an empty list is absent
    pub fn tokens(items: Vec<String>) -> Self {
        if items.is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::Tokens(items)
        }
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FieldValue::from_json)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Absent => serializer.serialize_none(),
            FieldValue::Text(s) | FieldValue::Scalar(s) => serializer.serialize_str(s),
            FieldValue::Tokens(items) => items.serialize(serializer),
        }
    }
}

/// Structured description of a tool invocation
///
/// `subcommand` is read by the gh plugin and `args` by the git plugin;
/// each plugin ignores the field that does not belong to it.
///
/// A request deserialized from JSON remembers the document it came from
/// and serializes back to it unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRequest {
    pub command: FieldValue,
    pub subcommand: FieldValue,
    pub args: FieldValue,
    /// The JSON this request was parsed from
    pub received: Option<Value>,
}

/// The resolved fields of a request
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct RequestFields {
    #[serde(skip_serializing_if = "FieldValue::is_absent")]
    command: FieldValue,
    #[serde(skip_serializing_if = "FieldValue::is_absent")]
    subcommand: FieldValue,
    #[serde(skip_serializing_if = "FieldValue::is_absent")]
    args: FieldValue,
}

impl CommandRequest {
    /// Parse a request and keep the original JSON
    pub fn from_json(received: Value) -> Result<Self, serde_json::Error> {
        let fields = RequestFields::deserialize(&received)?;
        Ok(Self {
            command: fields.command,
            subcommand: fields.subcommand,
            args: fields.args,
            received: Some(received),
        })
    }
}

impl<'de> Deserialize<'de> for CommandRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let received = Value::deserialize(deserializer)?;
        CommandRequest::from_json(received).map_err(serde::de::Error::custom)
    }
}

impl Serialize for CommandRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.received {
            Some(received) => received.serialize(serializer),
            None => RequestFields {
                command: self.command.clone(),
                subcommand: self.subcommand.clone(),
                args: self.args.clone(),
            }
            .serialize(serializer),
        }
    }
}

/// Per-call switches for `run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Compute the command without executing it
    pub dry_run: bool,
    /// Append an auto-confirm flag
    pub non_interactive: bool,
    /// Working directory for the subprocess
    pub cwd: Option<PathBuf>,
}

/// Advisory classification of a genuine failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorHints {
    pub error_type: HintKind,
    pub suggestions: Vec<String>,
}

/// Coarse failure categories, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    NotARepository,
    UnresolvedReference,
    InvalidArguments,
    NotFound,
    AuthenticationRequired,
    PermissionDenied,
}

/// Extra context attached to structured errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandContext {
    pub cwd: String,
}

/// Response from `run`
///
/// Keys are additive across paths; callers look for `error`, `result`
/// or `dry_run`. Unset keys are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd_args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args_received: Option<CommandRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_interactive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_context: Option<CommandContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_hints: Option<ErrorHints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

impl RunResponse {
    /// Create a structured error response
    pub fn error(code: &str, kind: &str, message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(message.into()),
            error_code: Some(code.to_string()),
            error_type: Some(kind.to_string()),
            ..Default::default()
        }
    }

    /// Whether the response carries a top-level `error` key
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Parameter definition for `describe`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,
    /// Parameter type (string, number, boolean, array, object)
    #[serde(rename = "type")]
    pub param_type: String,
    /// Description
    pub description: String,
    /// Whether parameter is required
    #[serde(default)]
    pub required: bool,
}

/// Command exposed by a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterDef>,
}

/// Plugin identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Static metadata returned by `describe`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescription {
    pub plugin: PluginInfo,
    pub commands: Vec<CommandDef>,
}
