//! Provider-specific instance attributes, encoded as a static table so new
//! providers are a row, not a code path.

use crate::terraform::RawResource;

#[derive(Debug, Clone, Copy)]
pub struct InstanceProvider {
    pub resource_type: &'static str,
    /// Attribute naming the machine size/shape, surfaced on the resource.
    pub instance_type_attribute: &'static str,
    /// Attribute naming the concrete instance, surfaced on the agent when
    /// its auth mode matches.
    pub instance_id_attribute: &'static str,
    pub auth_mode: &'static str,
}

pub const INSTANCE_PROVIDERS: &[InstanceProvider] = &[
    InstanceProvider {
        resource_type: "google_compute_instance",
        instance_type_attribute: "machine_type",
        instance_id_attribute: "instance_id",
        auth_mode: "google-instance-identity",
    },
    InstanceProvider {
        resource_type: "aws_instance",
        instance_type_attribute: "instance_type",
        instance_id_attribute: "id",
        auth_mode: "aws-instance-identity",
    },
    InstanceProvider {
        resource_type: "aws_spot_instance_request",
        instance_type_attribute: "instance_type",
        instance_id_attribute: "spot_instance_id",
        auth_mode: "aws-instance-identity",
    },
    InstanceProvider {
        resource_type: "azurerm_linux_virtual_machine",
        instance_type_attribute: "size",
        instance_id_attribute: "virtual_machine_id",
        auth_mode: "azure-instance-identity",
    },
    InstanceProvider {
        resource_type: "azurerm_windows_virtual_machine",
        instance_type_attribute: "size",
        instance_id_attribute: "virtual_machine_id",
        auth_mode: "azure-instance-identity",
    },
];

pub fn provider_for(resource_type: &str) -> Option<&'static InstanceProvider> {
    INSTANCE_PROVIDERS
        .iter()
        .find(|provider| provider.resource_type == resource_type)
}

/// The table row serving a given agent auth mode on a given resource type,
/// if any. An `aws-instance-identity` agent never reads identity off a
/// Google instance.
pub fn provider_for_auth(
    resource_type: &str,
    auth_mode: &str,
) -> Option<&'static InstanceProvider> {
    provider_for(resource_type).filter(|provider| provider.auth_mode == auth_mode)
}

/// Reads the instance attribute off a provider resource, tolerating the
/// numeric ids some providers report.
pub fn read_attribute(resource: &RawResource, attribute: &str) -> Option<String> {
    match resource.attributes.get(attribute)? {
        serde_json::Value::String(value) => Some(value.clone()),
        serde_json::Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
