// ABOUTME: The batch executor: starts services batch by batch over the runtime.
// ABOUTME: Gates each batch on readiness; failures block only their dependents.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;

use crate::config::Descriptor;
use crate::diagnostics::{Diagnostics, Warning};
use crate::graph::{DependencyGraph, Schedule};
use crate::output::Output;
use crate::runtime::{
    ContainerOps, ImageOps, NetworkConfig, NetworkError, NetworkOps,
};
use crate::types::{ContainerId, NetworkId, ServiceName};

use super::error::{ExecError, LaunchError};
use super::launch::Launch;
use super::state::Initialized;
use super::table::{ServiceState, StateTable};

/// Grace given to containers stopped on operator abort.
const ABORT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for an `up` run.
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Pull images even when they exist locally.
    pub force_pull: bool,
}

/// What an `up` run left behind.
///
/// A run with failures still returns `Ok`: unrelated subtrees were executed
/// and their states recorded, which the caller reports alongside the
/// failures.
#[derive(Debug, Default)]
pub struct UpOutcome {
    /// Services whose launch failed, with the error message.
    pub failures: Vec<(ServiceName, String)>,
    /// Services never issued because a dependency failed.
    pub blocked: Vec<ServiceName>,
}

impl UpOutcome {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ensure the project network exists, creating it if necessary.
///
/// # Errors
///
/// Returns `ExecError::NetworkFailed` if the network cannot be created.
pub async fn ensure_network<R: NetworkOps>(
    runtime: &R,
    name: &str,
) -> Result<NetworkId, ExecError> {
    // Check if the network already exists
    if runtime.network_exists(name).await.unwrap_or(false) {
        // Network exists, return name as ID (Docker/Podman accept both)
        return Ok(NetworkId::new(name.to_string()));
    }

    let mut labels = BTreeMap::new();
    labels.insert("flotilla.managed".to_string(), "true".to_string());

    let config = NetworkConfig {
        name: name.to_string(),
        driver: Some("bridge".to_string()),
        labels,
    };

    match runtime.create_network(&config).await {
        Ok(_) => Ok(NetworkId::new(name.to_string())),
        // Race condition: network was created between check and create
        Err(NetworkError::AlreadyExists(_)) => Ok(NetworkId::new(name.to_string())),
        Err(e) => Err(ExecError::NetworkFailed(e.to_string())),
    }
}

/// Execute the schedule: start every batch in order, waiting for each
/// batch's members to become ready before issuing the next.
///
/// Members of one batch start concurrently. A failed service marks its
/// transitive dependents blocked (they stay Pending and are never issued);
/// services in unrelated subtrees keep starting. An operator abort via the
/// `cancel` channel stops issuing batches, drops in-flight launches, and
/// stops the containers this run already started.
///
/// # Errors
///
/// Returns `ExecError` only for whole-run failures (network setup,
/// cancellation). Per-service failures land in the outcome.
#[allow(clippy::too_many_arguments)]
pub async fn up<R>(
    runtime: &R,
    descriptor: &Descriptor,
    graph: &DependencyGraph,
    schedule: &Schedule,
    table: &StateTable,
    cancel: &mut watch::Receiver<bool>,
    options: &UpOptions,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<UpOutcome, ExecError>
where
    R: ImageOps + ContainerOps + NetworkOps,
{
    ensure_network(runtime, &descriptor.network_name()).await?;

    let mut blocked: BTreeSet<ServiceName> = BTreeSet::new();
    let mut failures: Vec<(ServiceName, String)> = Vec::new();
    let total = schedule.len();

    for (index, batch) in schedule.batches().iter().enumerate() {
        if *cancel.borrow() {
            stop_started(runtime, descriptor, table).await;
            return Err(ExecError::Interrupted);
        }

        let mut launches: Vec<Launch<Initialized>> = Vec::new();
        for name in batch.iter() {
            if blocked.contains(name) {
                tracing::info!(service = %name, "not starting: blocked by failed dependency");
                continue;
            }
            let launch = Launch::new(descriptor, name)
                .ok_or_else(|| ExecError::UnknownService(name.clone()))?;
            launches.push(launch);
        }

        if launches.is_empty() {
            continue;
        }

        let member_names: Vec<String> = launches
            .iter()
            .map(|l| l.service().to_string())
            .collect();
        output.progress(&format!(
            "Batch {}/{}: starting {}",
            index + 1,
            total,
            member_names.join(", ")
        ));

        let batch_futures = launches.into_iter().map(|launch| {
            let name = launch.service().clone();
            async move {
                let result = drive(launch, runtime, table, options.force_pull).await;
                (name, result)
            }
        });

        let results = tokio::select! {
            results = join_all(batch_futures) => results,
            _ = cancelled(cancel) => {
                stop_started(runtime, descriptor, table).await;
                return Err(ExecError::Interrupted);
            }
        };

        for (name, result) in results {
            let Err(error) = result else { continue };

            let message = error.to_string();
            table.set(&name, ServiceState::Failed, Some(message.clone()));
            output.error(&format!("{}: {}", name, message));

            let best_effort = descriptor.spec(&name).is_some_and(|s| s.best_effort);
            if best_effort {
                diag.warn(Warning::new(format!(
                    "best-effort service {} failed: {}",
                    name, message
                )));
            } else {
                for dependent in graph.transitive_dependents(&name) {
                    blocked.insert(dependent);
                }
            }

            failures.push((name, message));
        }
    }

    Ok(UpOutcome {
        failures,
        blocked: blocked.into_iter().collect(),
    })
}

/// Drive one launch from Initialized to its terminal state, mirroring
/// progress into the state table.
async fn drive<R>(
    launch: Launch<Initialized>,
    runtime: &R,
    table: &StateTable,
    force_pull: bool,
) -> Result<(), LaunchError>
where
    R: ImageOps + ContainerOps,
{
    let service = launch.service().clone();
    let one_shot = launch.spec().one_shot;
    let has_healthcheck = launch.spec().healthcheck.is_some();

    table.set(&service, ServiceState::Starting, None);
    tracing::debug!(service = %service, image = %launch.image(), "launching");

    let pulled = launch.pull_image(runtime, force_pull).await?;
    let started = pulled.start_container(runtime).await?;

    table.set(&service, ServiceState::Running, None);

    if one_shot {
        let finished = started.await_exit(runtime).await?;
        tracing::debug!(service = %service, container = %finished.exited_container(), "one-shot completed");
        // Natural exit with code 0 counts as success for dependents
        table.set(&service, ServiceState::Stopped, Some("exited 0".to_string()));
    } else {
        let ready = started.await_ready(runtime).await?;
        tracing::debug!(service = %service, container = %ready.running_container(), "service ready");
        if has_healthcheck {
            table.set(&service, ServiceState::Healthy, None);
        }
    }

    Ok(())
}

/// Resolve when cancellation is signalled. Never resolves if the sender is
/// gone, since no signal can arrive then.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Stop every container this run started. Used on operator abort.
async fn stop_started<R: ContainerOps>(runtime: &R, descriptor: &Descriptor, table: &StateTable) {
    for row in table.snapshot() {
        match row.state {
            ServiceState::Starting | ServiceState::Running | ServiceState::Healthy => {}
            _ => continue,
        }

        // The daemon accepts container names wherever IDs go
        let id = ContainerId::new(descriptor.container_name(&row.service));
        match runtime.stop_container(&id, ABORT_STOP_TIMEOUT).await {
            Ok(()) => {
                table.set(&row.service, ServiceState::Stopped, Some("interrupted".to_string()));
            }
            Err(e) => {
                tracing::warn!(service = %row.service, "failed to stop on abort: {}", e);
            }
        }
    }
}
