/// Failures surfaced by [`crate::convert_state`]. Conversion never returns a
/// partial state: the first error aborts the whole call.
///
/// Several message substrings are matched by downstream consumers and must
/// stay stable: `invalid app slug`, `duplicate app slug`,
/// `duplicate metadata resource: <address>` and the
/// `coder_parameter names must be unique but …` enumeration.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to parse terraform output: {source}")]
    InputParse {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse dependency graph: {reason}")]
    GraphParse { reason: String },
    #[error("failed to decode `{address}`: {reason}")]
    Decode { address: String, reason: String },
    #[error("missing required attribute `{field}` on `{address}`")]
    MissingAttribute { address: String, field: String },
    #[error("agent `{name}` at `{address}` has no reachable resource to attach to")]
    UnattachedAgent { name: String, address: String },
    #[error("duplicate agent name: {name}")]
    DuplicateAgentName { name: String },
    #[error("invalid app slug {slug:?}, slugs must be lowercase alphanumeric runs separated by single hyphens")]
    InvalidAppSlug { slug: String },
    #[error("duplicate app slug, slugs must be unique per workspace: {slug:?}")]
    DuplicateAppSlug { slug: String },
    #[error("duplicate metadata resource: {target}")]
    DuplicateMetadataTarget { target: String },
    #[error("coder_parameter names must be unique but {} multiple times", enumerate_repeated(.names))]
    DuplicateParameterNames { names: Vec<String> },
    #[error("parameter `{parameter}` declares an invalid range: min {min} is greater than max {max}")]
    InvalidRange {
        parameter: String,
        min: i32,
        max: i32,
    },
    #[error("validation failed for `{subject}`: {reason}")]
    Validation { subject: String, reason: String },
}

impl ConvertError {
    pub(crate) fn decode(address: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(subject: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            subject: subject.to_string(),
            reason: reason.into(),
        }
    }
}

/// Renders repeated parameter names as `"a" appears`, `"a" and "b" appear`
/// or `"a", "b" and "c" appear`. The phrasing is part of the error surface.
fn enumerate_repeated(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| format!("{name:?}")).collect();
    match quoted.as_slice() {
        [] => "nothing appears".to_string(),
        [only] => format!("{only} appears"),
        [head @ .., last] => format!("{} and {last} appear", head.join(", ")),
    }
}
