use std::collections::BTreeMap;

use crate::attributes::value::AttributeBag;
use crate::error::ConvertError;
use crate::terraform::RawResource;

/// Auth mode strings a `coder_agent` may declare. Anything other than a
/// token selects instance-identity auth and is matched against the provider
/// table during instance association.
pub const AUTH_TOKEN: &str = "token";

#[derive(Debug, Clone, Default)]
pub struct AgentAttributes {
    pub id: String,
    pub auth_mode: String,
    pub operating_system: String,
    pub architecture: String,
    pub directory: String,
    pub token: String,
    pub env: BTreeMap<String, String>,
    pub startup_script: String,
    pub startup_script_behavior: String,
    pub shutdown_script: String,
    pub connection_timeout_seconds: i32,
    pub troubleshooting_url: String,
    pub motd_file: String,
    pub metadata: Vec<AgentMetadataAttributes>,
    pub display_apps: Option<DisplayAppsAttributes>,
    pub subsystems: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentMetadataAttributes {
    pub key: String,
    pub display_name: String,
    pub script: String,
    pub interval: i64,
    pub timeout: i64,
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayAppsAttributes {
    pub vscode: bool,
    pub vscode_insiders: bool,
    pub web_terminal: bool,
    pub ssh_helper: bool,
    pub port_forwarding_helper: bool,
}

impl AgentAttributes {
    pub fn decode(resource: &RawResource) -> Result<Self, ConvertError> {
        let bag = AttributeBag::new(&resource.address, &resource.attributes);
        let metadata = bag
            .blocks("metadata")?
            .iter()
            .map(|block| {
                Ok(AgentMetadataAttributes {
                    key: block.require_str("key")?,
                    display_name: block.str_or_default("display_name")?,
                    script: block.str_or_default("script")?,
                    interval: block.i64_or_default("interval")?,
                    timeout: block.i64_or_default("timeout")?,
                    order: block.i64_or_default("order")?,
                })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;

        // `display_apps` is a block list; no block at all means the
        // defaults, an explicit block means exactly what it says.
        let display_apps = match bag.blocks("display_apps")?.first() {
            None => None,
            Some(block) => Some(DisplayAppsAttributes {
                vscode: block.bool_or_default("vscode")?,
                vscode_insiders: block.bool_or_default("vscode_insiders")?,
                web_terminal: block.bool_or_default("web_terminal")?,
                ssh_helper: block.bool_or_default("ssh_helper")?,
                port_forwarding_helper: block.bool_or_default("port_forwarding_helper")?,
            }),
        };

        Ok(Self {
            id: bag.str_or_default("id")?,
            auth_mode: bag.str_or_default("auth")?,
            operating_system: bag.str_or_default("os")?,
            architecture: bag.str_or_default("arch")?,
            directory: bag.str_or_default("dir")?,
            token: bag.str_or_default("token")?,
            env: bag.string_map("env")?,
            startup_script: bag.str_or_default("startup_script")?,
            startup_script_behavior: bag.str_or_default("startup_script_behavior")?,
            shutdown_script: bag.str_or_default("shutdown_script")?,
            connection_timeout_seconds: bag.i32_or_default("connection_timeout")?,
            troubleshooting_url: bag.str_or_default("troubleshooting_url")?,
            motd_file: bag.str_or_default("motd_file")?,
            metadata,
            display_apps,
            subsystems: bag.string_list("subsystems")?,
        })
    }

    pub fn wants_token_auth(&self) -> bool {
        self.auth_mode.is_empty() || self.auth_mode == AUTH_TOKEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::ResourceMode;

    fn agent_resource(attributes: &str) -> RawResource {
        RawResource {
            address: "coder_agent.main".to_string(),
            resource_type: "coder_agent".to_string(),
            name: "main".to_string(),
            mode: ResourceMode::Managed,
            attributes: serde_json::from_str(attributes).expect("fixture attributes"),
            depends_on: Vec::new(),
        }
    }

    #[test]
    fn decodes_core_agent_attributes() {
        let resource = agent_resource(
            r#"{
                "os": "linux",
                "arch": "amd64",
                "auth": "token",
                "token": "secret",
                "connection_timeout": 120,
                "env": {"PATH_SUFFIX": "/opt/bin"},
                "motd_file": "/etc/motd"
            }"#,
        );
        let attrs = AgentAttributes::decode(&resource).expect("decode agent");
        assert_eq!(attrs.operating_system, "linux");
        assert_eq!(attrs.architecture, "amd64");
        assert_eq!(attrs.connection_timeout_seconds, 120);
        assert!(attrs.wants_token_auth());
        assert_eq!(
            attrs.env.get("PATH_SUFFIX").map(String::as_str),
            Some("/opt/bin")
        );
        assert!(attrs.display_apps.is_none());
    }

    #[test]
    fn instance_identity_auth_is_not_token_auth() {
        let resource = agent_resource(r#"{"arch": "amd64", "auth": "aws-instance-identity"}"#);
        let attrs = AgentAttributes::decode(&resource).expect("decode agent");
        assert!(!attrs.wants_token_auth());
        assert_eq!(attrs.auth_mode, "aws-instance-identity");
    }

    #[test]
    fn metadata_blocks_keep_declaration_order() {
        let resource = agent_resource(
            r#"{
                "metadata": [
                    {"key": "process_count", "display_name": "Process Count",
                     "script": "ps -ef | wc -l", "interval": 5, "timeout": 1, "order": 7},
                    {"key": "load", "script": "uptime", "interval": 10}
                ]
            }"#,
        );
        let attrs = AgentAttributes::decode(&resource).expect("decode agent");
        assert_eq!(attrs.metadata.len(), 2);
        assert_eq!(attrs.metadata[0].key, "process_count");
        assert_eq!(attrs.metadata[0].order, 7);
        assert_eq!(attrs.metadata[1].key, "load");
    }

    #[test]
    fn explicit_display_apps_block_decodes_every_flag() {
        let resource = agent_resource(
            r#"{"display_apps": [{"vscode_insiders": true, "web_terminal": true}]}"#,
        );
        let attrs = AgentAttributes::decode(&resource).expect("decode agent");
        let display = attrs.display_apps.expect("explicit block");
        assert!(display.vscode_insiders);
        assert!(display.web_terminal);
        assert!(!display.vscode);
    }
}
