use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ConvertError;

/// Subset of `terraform show -json <plan>` consumed by the converter.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub planned_values: ValuesRoot,
    #[serde(default)]
    pub prior_state: Option<PriorState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorState {
    pub values: ValuesRoot,
}

/// Subset of `terraform show -json` for an applied state.
#[derive(Debug, Clone, Deserialize)]
pub struct StateDump {
    pub values: ValuesRoot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuesRoot {
    pub root_module: Module,
}

impl Plan {
    pub fn parse(raw: &str) -> Result<Self, ConvertError> {
        serde_json::from_str(raw).map_err(|source| ConvertError::InputParse { source })
    }

    /// Both views of the deployment. Terraform reports different resource
    /// sets in the planned values and the prior state, so conversion takes
    /// the union. When no prior state exists the planned view is passed
    /// twice; the flattener deduplicates by address either way.
    pub fn modules(&self) -> Vec<&Module> {
        match &self.prior_state {
            Some(prior) => vec![&self.planned_values.root_module, &prior.values.root_module],
            None => vec![&self.planned_values.root_module, &self.planned_values.root_module],
        }
    }
}

impl StateDump {
    pub fn parse(raw: &str) -> Result<Self, ConvertError> {
        serde_json::from_str(raw).map_err(|source| ConvertError::InputParse { source })
    }

    pub fn modules(&self) -> Vec<&Module> {
        vec![&self.values.root_module]
    }
}

/// A named subtree of resources. Purely structural; the flattener collapses
/// the whole tree into a [`Catalog`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub resources: Vec<RawResource>,
    #[serde(default)]
    pub child_modules: Vec<Module>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMode {
    Managed,
    Data,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResource {
    /// Full address as reported by terraform, module path included
    /// (`module.x.aws_instance.y`).
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub mode: ResourceMode,
    #[serde(default, rename = "values")]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl RawResource {
    pub fn is_managed(&self) -> bool {
        self.mode == ResourceMode::Managed
    }

    /// Whether this resource is a workspace declaration rather than real
    /// infrastructure.
    pub fn is_coder(&self) -> bool {
        self.resource_type.starts_with("coder_")
    }

    /// A managed resource that carries output: everything except the
    /// `coder_*` declaration types and data sources.
    pub fn is_infrastructure(&self) -> bool {
        self.is_managed() && !self.is_coder()
    }
}

/// Flat, order-preserving catalog of resources keyed by address.
///
/// Order is the pre-order module walk and is observable: when an agent sits
/// at equal graph distance from two resources, the earlier catalog entry
/// wins.
#[derive(Debug, Default)]
pub struct Catalog {
    resources: Vec<RawResource>,
    by_address: HashMap<String, usize>,
}

impl Catalog {
    pub fn get(&self, address: &str) -> Option<&RawResource> {
        self.by_address
            .get(address)
            .map(|&index| &self.resources[index])
    }

    /// Position of the address in flattened order.
    pub fn position(&self, address: &str) -> Option<usize> {
        self.by_address.get(address).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawResource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn insert(&mut self, resource: RawResource) {
        match self.by_address.get(&resource.address) {
            // Duplicate address across the plan and prior-state views:
            // attributes last-write-wins, first position kept.
            Some(&index) => self.resources[index] = resource,
            None => {
                self.by_address
                    .insert(resource.address.clone(), self.resources.len());
                self.resources.push(resource);
            }
        }
    }
}

/// Collapses one or more module roots into a flat address-indexed catalog.
/// Pre-order: a module's own resources first, child modules after.
pub fn flatten(modules: &[&Module]) -> Catalog {
    let mut catalog = Catalog::default();
    for module in modules {
        flatten_into(module, &mut catalog);
    }
    catalog
}

fn flatten_into(module: &Module, catalog: &mut Catalog) {
    for resource in &module.resources {
        catalog.insert(resource.clone());
    }
    for child in &module.child_modules {
        flatten_into(child, catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(address: &str, marker: &str) -> RawResource {
        let (resource_type, name) = address.rsplit_once('.').expect("two-part address");
        let mut attributes = Map::new();
        attributes.insert("marker".to_string(), Value::String(marker.to_string()));
        RawResource {
            address: address.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            mode: ResourceMode::Managed,
            attributes,
            depends_on: Vec::new(),
        }
    }

    #[test]
    fn flatten_walks_parents_before_children() {
        let root = Module {
            resources: vec![resource("null_resource.root", "a")],
            child_modules: vec![Module {
                resources: vec![resource("module.m.null_resource.child", "b")],
                child_modules: vec![Module {
                    resources: vec![resource("module.m.module.n.null_resource.leaf", "c")],
                    child_modules: Vec::new(),
                }],
            }],
        };

        let catalog = flatten(&[&root]);
        let addresses: Vec<&str> = catalog.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec![
                "null_resource.root",
                "module.m.null_resource.child",
                "module.m.module.n.null_resource.leaf",
            ]
        );
    }

    #[test]
    fn flatten_deduplicates_addresses_keeping_first_position() {
        let planned = Module {
            resources: vec![
                resource("null_resource.a", "planned"),
                resource("null_resource.b", "planned"),
            ],
            child_modules: Vec::new(),
        };
        let prior = Module {
            resources: vec![resource("null_resource.a", "prior")],
            child_modules: Vec::new(),
        };

        let catalog = flatten(&[&planned, &prior]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.position("null_resource.a"), Some(0));
        // Last write wins for the attribute bag.
        let merged = catalog.get("null_resource.a").expect("resource present");
        assert_eq!(
            merged.attributes.get("marker").and_then(Value::as_str),
            Some("prior")
        );
    }

    #[test]
    fn plan_without_prior_state_passes_planned_view_twice() {
        let plan = Plan::parse(
            r#"{
                "planned_values": {
                    "root_module": {
                        "resources": [{
                            "address": "null_resource.a",
                            "type": "null_resource",
                            "name": "a",
                            "mode": "managed",
                            "values": {}
                        }]
                    }
                }
            }"#,
        )
        .expect("parse plan");

        let modules = plan.modules();
        assert_eq!(modules.len(), 2);
        let catalog = flatten(&modules);
        assert_eq!(catalog.len(), 1);
    }
}
