use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::attach;
use crate::attributes::{
    self, AgentAttributes, AppAttributes, EnvAttributes, MetadataAttributes, ParameterAttributes,
    ScriptAttributes,
};
use crate::error::ConvertError;
use crate::graph::DependencyGraph;
use crate::instances;
use crate::state::{
    Agent, AgentAuth, AgentMetadata, App, DisplayApps, Healthcheck, Parameter, ParameterOption,
    ParameterValidation, Resource, ResourceMetadata, Script, State,
};
use crate::terraform::{flatten, Catalog, Module};
use crate::validate;

/// Converts the two representations of a deployment (the module tree and
/// the DOT dependency graph) into the workspace [`State`].
///
/// Callers pass both the planned and prior-state module roots; duplicate
/// addresses across the views are deduplicated. The first error aborts the
/// conversion and no partial state is returned.
pub fn convert_state(modules: &[&Module], raw_graph: &str) -> Result<State, ConvertError> {
    let catalog = flatten(modules);
    let graph = DependencyGraph::parse(raw_graph)?;

    let mut builder = StateBuilder::new(&catalog, &graph);
    builder.collect_agents()?;
    builder.collect_apps()?;
    builder.collect_scripts()?;
    builder.collect_env()?;
    builder.collect_metadata()?;
    builder.collect_parameters()?;
    builder.collect_external_auth()?;
    builder.note_unknown_declarations();
    builder.associate_instances();

    let state = builder.assemble();
    validate::validate(&state)?;
    Ok(state)
}

/// An agent being assembled, still carrying the addresses the output model
/// deliberately drops.
struct AgentDraft {
    host_address: String,
    auth_mode: String,
    agent: Agent,
}

/// Attributes a metadata block or instance association adds to an output
/// resource, keyed by address until assembly.
#[derive(Default)]
struct ResourceDecoration {
    hide: bool,
    icon: String,
    daily_cost: i32,
    instance_type: String,
    metadata: Vec<ResourceMetadata>,
}

struct StateBuilder<'a> {
    catalog: &'a Catalog,
    graph: &'a DependencyGraph,
    agents: Vec<AgentDraft>,
    agent_index_by_address: BTreeMap<String, usize>,
    agent_names: BTreeSet<String>,
    app_slugs: BTreeSet<String>,
    decorations: BTreeMap<String, ResourceDecoration>,
    metadata_targets: BTreeSet<String>,
    parameters: Vec<Parameter>,
    external_auth: BTreeSet<String>,
}

impl<'a> StateBuilder<'a> {
    fn new(catalog: &'a Catalog, graph: &'a DependencyGraph) -> Self {
        Self {
            catalog,
            graph,
            agents: Vec::new(),
            agent_index_by_address: BTreeMap::new(),
            agent_names: BTreeSet::new(),
            app_slugs: BTreeSet::new(),
            decorations: BTreeMap::new(),
            metadata_targets: BTreeSet::new(),
            parameters: Vec::new(),
            external_auth: BTreeSet::new(),
        }
    }

    fn collect_agents(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_AGENT {
                continue;
            }
            let attrs = AgentAttributes::decode(resource)?;
            if !self.agent_names.insert(resource.name.clone()) {
                return Err(ConvertError::DuplicateAgentName {
                    name: resource.name.clone(),
                });
            }
            // An agent nobody hosts cannot be reached by the control plane.
            let host = attach::agent_host(self.catalog, self.graph, &resource.address)
                .ok_or_else(|| ConvertError::UnattachedAgent {
                    name: resource.name.clone(),
                    address: resource.address.clone(),
                })?;

            let mut scripts = Vec::new();
            if !attrs.startup_script.is_empty() {
                scripts.push(Script {
                    log_path: "coder-startup-script.log".to_string(),
                    display_name: "Startup Script".to_string(),
                    icon: "/emojis/25b6.png".to_string(),
                    script: attrs.startup_script.clone(),
                    run_on_start: true,
                    start_blocks_login: attrs.startup_script_behavior == "blocking",
                    ..Default::default()
                });
            }
            if !attrs.shutdown_script.is_empty() {
                scripts.push(Script {
                    log_path: "coder-shutdown-script.log".to_string(),
                    display_name: "Shutdown Script".to_string(),
                    icon: "/emojis/25c0.png".to_string(),
                    script: attrs.shutdown_script.clone(),
                    run_on_stop: true,
                    ..Default::default()
                });
            }

            let auth = if attrs.wants_token_auth() {
                AgentAuth::Token(attrs.token.clone())
            } else {
                // identity arrives later, from the provider resource
                AgentAuth::InstanceId(String::new())
            };
            let display_apps = match attrs.display_apps {
                None => DisplayApps::default(),
                Some(block) => DisplayApps {
                    vscode: block.vscode,
                    vscode_insiders: block.vscode_insiders,
                    web_terminal: block.web_terminal,
                    ssh_helper: block.ssh_helper,
                    port_forwarding_helper: block.port_forwarding_helper,
                },
            };
            let metadata = attrs
                .metadata
                .into_iter()
                .map(|item| AgentMetadata {
                    key: item.key,
                    display_name: item.display_name,
                    script: item.script,
                    interval: item.interval,
                    timeout: item.timeout,
                    order: item.order,
                })
                .collect();

            let agent = Agent {
                id: attrs.id,
                name: resource.name.clone(),
                operating_system: attrs.operating_system,
                architecture: attrs.architecture,
                auth,
                env: attrs.env,
                directory: attrs.directory,
                motd_file: attrs.motd_file,
                connection_timeout_seconds: attrs.connection_timeout_seconds,
                troubleshooting_url: attrs.troubleshooting_url,
                startup_script: attrs.startup_script,
                shutdown_script: attrs.shutdown_script,
                scripts,
                apps: Vec::new(),
                metadata,
                display_apps,
                subsystems: attrs.subsystems,
            };
            self.agent_index_by_address
                .insert(resource.address.clone(), self.agents.len());
            self.agents.push(AgentDraft {
                host_address: host.address.clone(),
                auth_mode: attrs.auth_mode,
                agent,
            });
        }
        Ok(())
    }

    /// Resolves the draft agent owning an entity declared at `address`, or
    /// logs and returns `None` when the entity floats free.
    fn owning_agent_index(&self, address: &str, kind: &str) -> Option<usize> {
        let Some(agent_resource) = attach::nearest_agent(self.catalog, self.graph, address) else {
            warn!(address, kind, "declaration has no reachable agent, skipping");
            return None;
        };
        self.agent_index_by_address
            .get(&agent_resource.address)
            .copied()
    }

    fn collect_apps(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_APP {
                continue;
            }
            let attrs = AppAttributes::decode(resource)?;
            // Slug rules apply to every declared app, reachable or not.
            validate::validate_app_slug(&attrs.slug)?;
            if !self.app_slugs.insert(attrs.slug.clone()) {
                return Err(ConvertError::DuplicateAppSlug { slug: attrs.slug });
            }
            let Some(index) = self.owning_agent_index(&resource.address, "app") else {
                continue;
            };
            self.agents[index].agent.apps.push(App {
                slug: attrs.slug,
                display_name: attrs.display_name,
                icon: attrs.icon,
                command: attrs.command,
                url: attrs.url,
                external: attrs.external,
                subdomain: attrs.subdomain,
                sharing_level: attrs.share,
                healthcheck: attrs.healthcheck.map(|check| Healthcheck {
                    url: check.url,
                    interval: check.interval,
                    threshold: check.threshold,
                }),
                order: attrs.order,
            });
        }
        Ok(())
    }

    fn collect_scripts(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_SCRIPT {
                continue;
            }
            let attrs = ScriptAttributes::decode(resource)?;
            let Some(index) = self.owning_agent_index(&resource.address, "script") else {
                continue;
            };
            self.agents[index].agent.scripts.push(Script {
                log_source_id: attrs.log_source_id,
                log_path: attrs.log_path,
                display_name: attrs.display_name,
                icon: attrs.icon,
                script: attrs.script,
                cron: attrs.cron,
                run_on_start: attrs.run_on_start,
                run_on_stop: attrs.run_on_stop,
                start_blocks_login: attrs.start_blocks_login,
                timeout_seconds: attrs.timeout_seconds,
            });
        }
        Ok(())
    }

    fn collect_env(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_ENV {
                continue;
            }
            let attrs = EnvAttributes::decode(resource)?;
            let Some(index) = self.owning_agent_index(&resource.address, "env") else {
                continue;
            };
            let env = &mut self.agents[index].agent.env;
            if env.contains_key(&attrs.name) {
                // the agent's own declaration is the more specific signal
                warn!(
                    address = resource.address.as_str(),
                    name = attrs.name.as_str(),
                    "env var already declared by the agent, skipping"
                );
                continue;
            }
            env.insert(attrs.name, attrs.value);
        }
        Ok(())
    }

    fn collect_metadata(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_METADATA {
                continue;
            }
            let attrs = MetadataAttributes::decode(resource)?;
            let Some(target) =
                attach::nearest_infrastructure(self.catalog, self.graph, &resource.address)
            else {
                warn!(
                    address = resource.address.as_str(),
                    "metadata block has no reachable resource, skipping"
                );
                continue;
            };
            if !self.metadata_targets.insert(target.address.clone()) {
                return Err(ConvertError::DuplicateMetadataTarget {
                    target: target.address.clone(),
                });
            }
            let decoration = self.decorations.entry(target.address.clone()).or_default();
            decoration.hide = attrs.hide;
            decoration.icon = attrs.icon;
            decoration.daily_cost = attrs.daily_cost;
            decoration.metadata = attrs
                .items
                .into_iter()
                .map(|item| ResourceMetadata {
                    key: item.key,
                    value: item.value,
                    is_null: item.is_null,
                    sensitive: item.sensitive,
                })
                .collect();
        }
        Ok(())
    }

    fn collect_parameters(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_PARAMETER {
                continue;
            }
            let attrs = ParameterAttributes::decode(resource)?;
            self.parameters.push(Parameter {
                name: attrs.name,
                parameter_type: attrs.parameter_type,
                description: attrs.description,
                required: attrs.default_value.is_none(),
                default_value: attrs.default_value.unwrap_or_default(),
                mutable: attrs.mutable,
                ephemeral: attrs.ephemeral,
                icon: attrs.icon,
                options: attrs
                    .options
                    .into_iter()
                    .map(|option| ParameterOption {
                        name: option.name,
                        description: option.description,
                        value: option.value,
                        icon: option.icon,
                    })
                    .collect(),
                validation: attrs.validation.map(|validation| ParameterValidation {
                    min: validation.min,
                    max: validation.max,
                    regex: validation.regex,
                    error: validation.error,
                    monotonic: validation.monotonic,
                }),
                order: attrs.order,
            });
        }
        Ok(())
    }

    fn collect_external_auth(&mut self) -> Result<(), ConvertError> {
        for resource in self.catalog.iter() {
            if resource.resource_type != attributes::TYPE_EXTERNAL_AUTH
                && resource.resource_type != attributes::TYPE_GIT_AUTH
            {
                continue;
            }
            let id = attributes::decode_external_auth_id(resource)?;
            self.external_auth.insert(id);
        }
        Ok(())
    }

    fn note_unknown_declarations(&self) {
        for resource in self.catalog.iter() {
            if resource.is_coder() && !attributes::is_known_coder_type(&resource.resource_type) {
                debug!(
                    address = resource.address.as_str(),
                    resource_type = resource.resource_type.as_str(),
                    "unrecognized workspace declaration, skipping"
                );
            }
        }
    }

    fn associate_instances(&mut self) {
        let catalog = self.catalog;
        let graph = self.graph;

        for resource in catalog.iter() {
            if !resource.is_infrastructure() {
                continue;
            }
            let Some(provider) = instances::provider_for(&resource.resource_type) else {
                continue;
            };
            if let Some(instance_type) =
                instances::read_attribute(resource, provider.instance_type_attribute)
            {
                self.decorations
                    .entry(resource.address.clone())
                    .or_default()
                    .instance_type = instance_type;
            }
        }

        for draft in &mut self.agents {
            if matches!(draft.agent.auth, AgentAuth::Token(_)) {
                continue;
            }
            let Some(host) = catalog.get(&draft.host_address) else {
                continue;
            };
            // The host itself is usually the provider instance; when the
            // agent sits on an intermediate resource, look one hop out.
            let candidate = std::iter::once(host)
                .chain(graph.neighbors(&host.address).filter_map(|n| catalog.get(n)))
                .find_map(|resource| {
                    instances::provider_for_auth(&resource.resource_type, &draft.auth_mode)
                        .map(|provider| (resource, provider))
                });
            if let Some((resource, provider)) = candidate {
                if let Some(id) = instances::read_attribute(resource, provider.instance_id_attribute)
                {
                    draft.agent.auth = AgentAuth::InstanceId(id);
                }
            }
        }
    }

    fn assemble(self) -> State {
        let mut agents_by_host: BTreeMap<String, Vec<Agent>> = BTreeMap::new();
        for draft in self.agents {
            let mut agent = draft.agent;
            agent.apps.sort_by(|a, b| a.slug.cmp(&b.slug));
            agents_by_host.entry(draft.host_address).or_default().push(agent);
        }

        let mut resources = Vec::new();
        for resource in self.catalog.iter() {
            if !resource.is_infrastructure() {
                continue;
            }
            let mut agents = agents_by_host.remove(&resource.address).unwrap_or_default();
            agents.sort_by(|a, b| a.name.cmp(&b.name));
            let mut output = Resource {
                name: resource.name.clone(),
                resource_type: resource.resource_type.clone(),
                agents,
                ..Default::default()
            };
            if let Some(decoration) = self.decorations.get(&resource.address) {
                output.hide = decoration.hide;
                output.icon = decoration.icon.clone();
                output.daily_cost = decoration.daily_cost;
                output.instance_type = decoration.instance_type.clone();
                output.metadata = decoration.metadata.clone();
            }
            resources.push(output);
        }
        resources.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.resource_type.cmp(&b.resource_type))
        });

        State {
            resources,
            parameters: self.parameters,
            external_auth_providers: self.external_auth.into_iter().collect(),
        }
    }
}
