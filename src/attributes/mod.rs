pub mod agent;
pub mod app;
pub mod metadata;
pub mod parameter;
pub mod script;
pub(crate) mod value;

pub use agent::{AgentAttributes, AgentMetadataAttributes, DisplayAppsAttributes};
pub use app::{AppAttributes, HealthcheckAttributes};
pub use metadata::{MetadataAttributes, MetadataItemAttributes};
pub use parameter::{ParameterAttributes, ParameterOptionAttributes, ParameterValidationAttributes};
pub use script::{EnvAttributes, ScriptAttributes};

use crate::error::ConvertError;
use crate::terraform::RawResource;
use value::AttributeBag;

/// Resource type prefixes the converter recognizes. `coder_git_auth` is the
/// deprecated spelling of `coder_external_auth` and decodes identically.
pub const TYPE_AGENT: &str = "coder_agent";
pub const TYPE_APP: &str = "coder_app";
pub const TYPE_SCRIPT: &str = "coder_script";
pub const TYPE_ENV: &str = "coder_env";
pub const TYPE_METADATA: &str = "coder_metadata";
pub const TYPE_PARAMETER: &str = "coder_parameter";
pub const TYPE_EXTERNAL_AUTH: &str = "coder_external_auth";
pub const TYPE_GIT_AUTH: &str = "coder_git_auth";

pub fn is_known_coder_type(resource_type: &str) -> bool {
    matches!(
        resource_type,
        TYPE_AGENT
            | TYPE_APP
            | TYPE_SCRIPT
            | TYPE_ENV
            | TYPE_METADATA
            | TYPE_PARAMETER
            | TYPE_EXTERNAL_AUTH
            | TYPE_GIT_AUTH
    )
}

/// Decodes the provider id of a `coder_external_auth` / `coder_git_auth`
/// declaration, e.g. `github`.
pub fn decode_external_auth_id(resource: &RawResource) -> Result<String, ConvertError> {
    AttributeBag::new(&resource.address, &resource.attributes).require_str("id")
}
