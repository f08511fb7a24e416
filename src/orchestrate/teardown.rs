// ABOUTME: Teardown: stop and remove a project's containers in reverse order.
// ABOUTME: Also sweeps orphaned containers and the project network.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::Descriptor;
use crate::graph::Schedule;
use crate::output::Output;
use crate::runtime::{ContainerFilters, ContainerOps, NetworkOps};
use crate::types::{ContainerId, NetworkId, ServiceName};

use super::error::ExecError;

/// Grace given to containers during teardown.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// What a `down` run did.
#[derive(Debug, Default)]
pub struct DownOutcome {
    /// Services whose containers were stopped and removed.
    pub stopped: Vec<ServiceName>,
    /// Services with no container to remove.
    pub missing: Vec<ServiceName>,
    /// Labeled containers that match no declared service (e.g. a service
    /// renamed since the last up). Removed as well.
    pub orphans: Vec<String>,
    /// Per-container teardown failures.
    pub failures: Vec<(String, String)>,
}

impl DownOutcome {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Stop and remove the project's containers in reverse topological order,
/// then remove the project network.
///
/// Stopping continues past individual failures so one wedged container
/// doesn't leave the rest of the stack running.
pub async fn down<R>(
    runtime: &R,
    descriptor: &Descriptor,
    schedule: &Schedule,
    output: &Output,
) -> Result<DownOutcome, ExecError>
where
    R: ContainerOps + NetworkOps,
{
    let mut filters = ContainerFilters {
        all: true,
        ..Default::default()
    };
    filters.labels.insert(
        "flotilla.project".to_string(),
        descriptor.project.to_string(),
    );
    filters
        .labels
        .insert("flotilla.managed".to_string(), "true".to_string());

    let containers = runtime
        .list_containers(&filters)
        .await
        .map_err(|e| ExecError::Runtime(format!("failed to list containers: {}", e)))?;

    // Index the project's containers by their service label
    let mut by_service: BTreeMap<ServiceName, ContainerId> = BTreeMap::new();
    let mut orphans: Vec<(String, ContainerId)> = Vec::new();
    for summary in containers {
        let service = summary
            .labels
            .get("flotilla.service")
            .and_then(|s| ServiceName::new(s).ok());
        match service {
            Some(name) if descriptor.services.contains_key(&name) => {
                by_service.insert(name, summary.id);
            }
            _ => orphans.push((summary.name, summary.id)),
        }
    }

    let mut outcome = DownOutcome::default();

    for service in schedule.stop_order() {
        let Some(id) = by_service.get(&service) else {
            outcome.missing.push(service);
            continue;
        };

        output.progress(&format!("Stopping {}", service));

        if let Err(e) = runtime.stop_container(id, STOP_TIMEOUT).await {
            // Exited one-shots and already-stopped containers are fine
            tracing::debug!(service = %service, "stop: {}", e);
        }

        match runtime.remove_container(id, true).await {
            Ok(()) => outcome.stopped.push(service),
            Err(e) => outcome.failures.push((service.to_string(), e.to_string())),
        }
    }

    for (name, id) in orphans {
        output.progress(&format!("Removing orphaned container {}", name));
        let _ = runtime.stop_container(&id, STOP_TIMEOUT).await;
        match runtime.remove_container(&id, true).await {
            Ok(()) => outcome.orphans.push(name),
            Err(e) => outcome.failures.push((name, e.to_string())),
        }
    }

    // The network only goes once nothing is attached; best effort
    let network = NetworkId::new(descriptor.network_name());
    if let Err(e) = runtime.remove_network(&network).await {
        tracing::debug!("network not removed: {}", e);
    }

    Ok(outcome)
}
