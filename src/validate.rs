//! Cross-entity invariants enforced after assembly. Everything here works
//! on the assembled output; checks that need raw addresses (duplicate
//! metadata targets, duplicate agent names) run during attachment instead.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConvertError;
use crate::state::{Parameter, ParameterType, State};

/// App slugs: lowercase alphanumeric runs separated by single hyphens, no
/// leading or trailing hyphen (`^[a-z0-9](-?[a-z0-9])*$`).
pub fn validate_app_slug(slug: &str) -> Result<(), ConvertError> {
    let well_formed = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ConvertError::InvalidAppSlug {
            slug: slug.to_string(),
        })
    }
}

/// Agent names: ASCII letters, digits, `-` or `_`, non-empty.
pub fn validate_agent_name(name: &str) -> Result<(), ConvertError> {
    if !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        Ok(())
    } else {
        Err(ConvertError::validation(
            name,
            "agent names may only contain ASCII letters, digits, '-' or '_'",
        ))
    }
}

pub fn validate(state: &State) -> Result<(), ConvertError> {
    let mut slugs = BTreeSet::new();
    for resource in &state.resources {
        if resource.daily_cost < 0 {
            return Err(ConvertError::validation(
                &resource.name,
                format!("daily cost must not be negative, got {}", resource.daily_cost),
            ));
        }
        for agent in &resource.agents {
            validate_agent_name(&agent.name)?;
            if agent.connection_timeout_seconds < 0 {
                return Err(ConvertError::validation(
                    &agent.name,
                    format!(
                        "connection timeout must not be negative, got {}",
                        agent.connection_timeout_seconds
                    ),
                ));
            }
            for app in &agent.apps {
                validate_app_slug(&app.slug)?;
                if !slugs.insert(app.slug.clone()) {
                    return Err(ConvertError::DuplicateAppSlug {
                        slug: app.slug.clone(),
                    });
                }
            }
        }
    }
    validate_parameters(&state.parameters)
}

pub fn validate_parameters(parameters: &[Parameter]) -> Result<(), ConvertError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for parameter in parameters {
        *counts.entry(parameter.name.as_str()).or_default() += 1;
    }
    let repeated: Vec<String> = counts
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    if !repeated.is_empty() {
        return Err(ConvertError::DuplicateParameterNames { names: repeated });
    }

    for parameter in parameters {
        let Some(validation) = &parameter.validation else {
            continue;
        };
        let (Some(min), Some(max)) = (validation.min, validation.max) else {
            // a lone bound constrains one side only, nothing to reconcile
            continue;
        };
        if min > max {
            return Err(ConvertError::InvalidRange {
                parameter: parameter.name.clone(),
                min,
                max,
            });
        }
        if parameter.parameter_type == ParameterType::Number && !parameter.default_value.is_empty()
        {
            if let Ok(default) = parameter.default_value.parse::<i64>() {
                if default < i64::from(min) || default > i64::from(max) {
                    return Err(ConvertError::validation(
                        &parameter.name,
                        format!("default value {default} is outside the range [{min}, {max}]"),
                    ));
                }
            }
        }
    }
    Ok(())
}
