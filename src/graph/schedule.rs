// ABOUTME: Topological start batches computed from the dependency graph.
// ABOUTME: Kahn layering with name-ascending order inside each batch.

use super::dependency::DependencyGraph;
use crate::types::ServiceName;
use nonempty::NonEmpty;
use std::collections::BTreeSet;

/// An ordered sequence of start batches.
///
/// Every member of a batch has all of its dependencies in strictly earlier
/// batches, so a batch may start concurrently. Flattening the batches gives
/// a total order covering each service exactly once.
#[derive(Debug, Clone)]
pub struct Schedule {
    batches: Vec<NonEmpty<ServiceName>>,
}

impl Schedule {
    pub fn batches(&self) -> &[NonEmpty<ServiceName>] {
        &self.batches
    }

    /// Total start order: batch by batch, names ascending within a batch.
    pub fn start_order(&self) -> Vec<ServiceName> {
        self.batches
            .iter()
            .flat_map(|batch| batch.iter().cloned())
            .collect()
    }

    /// Teardown order: the start order reversed.
    pub fn stop_order(&self) -> Vec<ServiceName> {
        let mut order = self.start_order();
        order.reverse();
        order
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl DependencyGraph {
    /// Compute start batches.
    ///
    /// Infallible: `build` already rejected cycles, so every round finds at
    /// least one service whose dependencies are all placed. Within a batch,
    /// services come out name-ascending because the underlying map iterates
    /// in key order.
    pub fn schedule(&self) -> Schedule {
        let mut placed: BTreeSet<ServiceName> = BTreeSet::new();
        let mut batches = Vec::new();

        while placed.len() < self.len() {
            let ready: Vec<ServiceName> = self
                .dependency_map()
                .iter()
                .filter(|(name, deps)| {
                    !placed.contains(*name) && deps.iter().all(|d| placed.contains(d))
                })
                .map(|(name, _)| name.clone())
                .collect();

            let batch = NonEmpty::from_vec(ready)
                .expect("acyclic graph always yields a non-empty ready set");

            placed.extend(batch.iter().cloned());
            batches.push(batch);
        }

        Schedule { batches }
    }
}
