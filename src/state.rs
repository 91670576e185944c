use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root result of a conversion: the workspace resources with their agents,
/// the workspace-level parameters in declaration order, and the external
/// auth providers the workspace requires, deduplicated and ascending.
///
/// The value is immutable once returned and serializes deterministically:
/// resources ascend by `(name, type)`, agents by name, apps by slug, and no
/// field is backed by a hash-ordered container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub resources: Vec<Resource>,
    pub parameters: Vec<Parameter>,
    pub external_auth_providers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub daily_cost: i32,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub metadata: Vec<ResourceMetadata>,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

/// One key/value display entry attached to a resource by a metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_null: bool,
    #[serde(default)]
    pub sensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub operating_system: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub auth: AgentAuth,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub motd_file: String,
    #[serde(default)]
    pub connection_timeout_seconds: i32,
    #[serde(default)]
    pub troubleshooting_url: String,
    /// Legacy single-script fields, kept verbatim next to the synthesized
    /// entries in `scripts`.
    #[serde(default)]
    pub startup_script: String,
    #[serde(default)]
    pub shutdown_script: String,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub apps: Vec<App>,
    #[serde(default)]
    pub metadata: Vec<AgentMetadata>,
    #[serde(default)]
    pub display_apps: DisplayApps,
    #[serde(default)]
    pub subsystems: Vec<String>,
}

/// How the agent proves its identity to the control plane. Token is the
/// default; instance-identity agents receive their id from a neighboring
/// provider resource during instance association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "snake_case")]
pub enum AgentAuth {
    Token(String),
    InstanceId(String),
}

impl Default for AgentAuth {
    fn default() -> Self {
        Self::Token(String::new())
    }
}

/// A periodically refreshed display item on an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub interval: i64,
    #[serde(default)]
    pub timeout: i64,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub slug: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub subdomain: bool,
    #[serde(default)]
    pub sharing_level: SharingLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingLevel {
    #[default]
    Owner,
    Authenticated,
    Public,
}

impl SharingLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Authenticated => "authenticated",
            Self::Public => "public",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "owner" | "" => Ok(Self::Owner),
            "authenticated" => Ok(Self::Authenticated),
            "public" => Ok(Self::Public),
            _ => Err("sharing level must be one of: owner, authenticated, public".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Healthcheck {
    pub url: String,
    #[serde(default)]
    pub interval: i64,
    #[serde(default)]
    pub threshold: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub log_source_id: String,
    #[serde(default)]
    pub log_path: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub cron: String,
    #[serde(default)]
    pub run_on_start: bool,
    #[serde(default)]
    pub run_on_stop: bool,
    #[serde(default)]
    pub start_blocks_login: bool,
    #[serde(default)]
    pub timeout_seconds: i64,
}

/// Built-in UI launchers an agent advertises. When a template says nothing,
/// everything except VS Code Insiders is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayApps {
    pub vscode: bool,
    pub vscode_insiders: bool,
    pub web_terminal: bool,
    pub ssh_helper: bool,
    pub port_forwarding_helper: bool,
}

impl Default for DisplayApps {
    fn default() -> Self {
        Self {
            vscode: true,
            vscode_insiders: false,
            web_terminal: true,
            ssh_helper: true,
            port_forwarding_helper: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub options: Vec<ParameterOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ParameterValidation>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    #[default]
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "list(string)")]
    ListString,
}

impl ParameterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::ListString => "list(string)",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "string" | "" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            "list(string)" => Ok(Self::ListString),
            _ => Err(
                "parameter type must be one of: string, number, bool, list(string)".to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOption {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub icon: String,
}

/// Constraints on a parameter value.
///
/// `min` and `max` are `None` only when the key was absent from the
/// template: a declared zero bound stays `Some(0)` all the way through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
    #[serde(default)]
    pub regex: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub monotonic: String,
}
