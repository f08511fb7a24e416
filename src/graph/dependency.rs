// ABOUTME: Directed dependency graph built from depends_on declarations.
// ABOUTME: Validates references, rejects cycles, exposes forward and reverse edges.

use crate::config::Descriptor;
use crate::types::ServiceName;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("service '{service}' depends on undeclared service '{dependency}'")]
    UnresolvedReference {
        service: ServiceName,
        dependency: ServiceName,
    },

    #[error("circular dependency between services: {}", join_names(.members))]
    Cycle { members: Vec<ServiceName> },
}

fn join_names(names: &[ServiceName]) -> String {
    names
        .iter()
        .map(ServiceName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The project's dependency graph: nodes are service names, edges point
/// from a service to the services it depends on.
///
/// A successfully built graph is acyclic with every edge resolved, so the
/// scheduler never has to re-validate.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    deps: BTreeMap<ServiceName, Vec<ServiceName>>,
    dependents: BTreeMap<ServiceName, Vec<ServiceName>>,
}

impl DependencyGraph {
    /// Build and validate the graph from a parsed descriptor.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnresolvedReference` for a dependency on an
    /// undeclared service, and `GraphError::Cycle` (naming the members)
    /// for a circular dependency. Both fire before any execution.
    pub fn build(descriptor: &Descriptor) -> Result<Self, GraphError> {
        let mut deps: BTreeMap<ServiceName, Vec<ServiceName>> = BTreeMap::new();
        let mut dependents: BTreeMap<ServiceName, Vec<ServiceName>> = BTreeMap::new();

        for (name, spec) in &descriptor.services {
            let entry = deps.entry(name.clone()).or_default();
            dependents.entry(name.clone()).or_default();

            for dep in &spec.depends_on {
                if !descriptor.services.contains_key(dep) {
                    return Err(GraphError::UnresolvedReference {
                        service: name.clone(),
                        dependency: dep.clone(),
                    });
                }
                // Duplicate declarations collapse to a single edge
                if !entry.contains(dep) {
                    entry.push(dep.clone());
                }
            }
        }

        for (name, dep_list) in &deps {
            for dep in dep_list {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(name.clone());
            }
        }

        let graph = Self { deps, dependents };

        if let Some(members) = graph.find_cycle() {
            return Err(GraphError::Cycle { members });
        }

        Ok(graph)
    }

    /// Services this service depends on.
    pub fn dependencies(&self, service: &ServiceName) -> &[ServiceName] {
        self.deps.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Services that directly depend on this service.
    pub fn dependents(&self, service: &ServiceName) -> &[ServiceName] {
        self.dependents
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All services reachable over reverse edges: everything that cannot
    /// start if `service` fails.
    pub fn transitive_dependents(&self, service: &ServiceName) -> BTreeSet<ServiceName> {
        let mut reached = BTreeSet::new();
        let mut frontier = vec![service.clone()];

        while let Some(current) = frontier.pop() {
            for dependent in self.dependents(&current) {
                if reached.insert(dependent.clone()) {
                    frontier.push(dependent.clone());
                }
            }
        }

        reached
    }

    /// Iterate node names in ascending order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceName> {
        self.deps.keys()
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub(crate) fn dependency_map(&self) -> &BTreeMap<ServiceName, Vec<ServiceName>> {
        &self.deps
    }

    /// Depth-first search for a cycle, returning its member services.
    ///
    /// Nodes are visited in name order so the reported cycle is
    /// deterministic for a given descriptor.
    fn find_cycle(&self) -> Option<Vec<ServiceName>> {
        let mut visiting = BTreeSet::new();
        let mut done = BTreeSet::new();
        let mut path = Vec::new();

        for node in self.deps.keys() {
            if !done.contains(node)
                && let Some(members) = self.visit(node, &mut visiting, &mut done, &mut path)
            {
                return Some(members);
            }
        }

        None
    }

    fn visit(
        &self,
        node: &ServiceName,
        visiting: &mut BTreeSet<ServiceName>,
        done: &mut BTreeSet<ServiceName>,
        path: &mut Vec<ServiceName>,
    ) -> Option<Vec<ServiceName>> {
        visiting.insert(node.clone());
        path.push(node.clone());

        for dep in self.dependencies(node) {
            if visiting.contains(dep) {
                // Found a back edge; the cycle is the path suffix from the
                // first occurrence of `dep`.
                let start = path
                    .iter()
                    .position(|n| n == dep)
                    .expect("node in visiting set is on the path");
                return Some(path[start..].to_vec());
            }
            if !done.contains(dep)
                && let Some(members) = self.visit(dep, visiting, done, path)
            {
                return Some(members);
            }
        }

        path.pop();
        visiting.remove(node);
        done.insert(node.clone());
        None
    }
}
