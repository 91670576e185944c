//! Ownership resolution: assigning each workspace declaration to the
//! infrastructure resource or agent it belongs to, by graph proximity.

use std::collections::BTreeSet;

use crate::attributes::TYPE_AGENT;
use crate::graph::DependencyGraph;
use crate::terraform::{Catalog, RawResource};

/// Undirected breadth-first search from `start`, returning every node that
/// satisfies `eligible` at the first depth where any does, in ascending
/// address order.
///
/// Nodes that fail the predicate are transparent: module, provider and
/// `coder_*` nodes are traversed through but never returned, so an entity
/// chained through a module still finds the resource on the far side. The
/// start node itself is never a candidate.
pub fn nearest_matches<'graph>(
    graph: &'graph DependencyGraph,
    start: &str,
    eligible: impl Fn(&str) -> bool,
) -> Vec<&'graph str> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    visited.insert(start);
    let mut frontier: Vec<&'graph str> = graph.neighbors(start).collect();
    visited.extend(frontier.iter().copied());
    while !frontier.is_empty() {
        let mut found: BTreeSet<&str> = BTreeSet::new();
        for &node in &frontier {
            if eligible(node) {
                found.insert(node);
            }
        }
        if !found.is_empty() {
            return found.into_iter().collect();
        }
        let mut next = Vec::new();
        for &node in &frontier {
            for neighbor in graph.neighbors(node) {
                if visited.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
    }
    Vec::new()
}

/// Nearest managed infrastructure resource, ties broken by ascending
/// address. Used for metadata blocks and any other resource-owned entity.
pub fn nearest_infrastructure<'catalog>(
    catalog: &'catalog Catalog,
    graph: &DependencyGraph,
    start: &str,
) -> Option<&'catalog RawResource> {
    let matches = nearest_matches(graph, start, |address| {
        catalog.get(address).is_some_and(RawResource::is_infrastructure)
    });
    matches.first().and_then(|address| catalog.get(address))
}

/// The resource that hosts an agent. Same search as
/// [`nearest_infrastructure`], but equal-depth ties resolve to the resource
/// listed first in the flattened catalog; that order is observable when two
/// resources conflict over one agent.
pub fn agent_host<'catalog>(
    catalog: &'catalog Catalog,
    graph: &DependencyGraph,
    agent_address: &str,
) -> Option<&'catalog RawResource> {
    let matches = nearest_matches(graph, agent_address, |address| {
        catalog.get(address).is_some_and(RawResource::is_infrastructure)
    });
    matches
        .into_iter()
        .min_by_key(|address| catalog.position(address))
        .and_then(|address| catalog.get(address))
}

/// Nearest agent declaration, for apps, scripts and env pairs. Ties break
/// by ascending address.
pub fn nearest_agent<'catalog>(
    catalog: &'catalog Catalog,
    graph: &DependencyGraph,
    start: &str,
) -> Option<&'catalog RawResource> {
    let matches = nearest_matches(graph, start, |address| {
        catalog
            .get(address)
            .is_some_and(|resource| resource.resource_type == TYPE_AGENT)
    });
    matches.first().and_then(|address| catalog.get(address))
}
