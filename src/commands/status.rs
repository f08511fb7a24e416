// ABOUTME: Status command implementation.
// ABOUTME: Prints live per-service container state queried by project label.

use std::collections::BTreeMap;

use super::runtime_connection::connect_to_runtime;
use flotilla::config::Descriptor;
use flotilla::error::{Error, Result};
use flotilla::output::Output;
use flotilla::runtime::{ContainerFilters, ContainerOps, ContainerSummary, RuntimeConfig};
use flotilla::types::ServiceName;

/// Print one row per declared service with its container's live state.
pub async fn status(
    descriptor: Descriptor,
    runtime_config: RuntimeConfig,
    output: Output,
) -> Result<()> {
    let runtime = connect_to_runtime(&runtime_config).await?;

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
        .map_err(|e| Error::Status(e.to_string()))?;

    let by_service: BTreeMap<ServiceName, ContainerSummary> = containers
        .into_iter()
        .filter_map(|c| {
            let service = c
                .labels
                .get("flotilla.service")
                .and_then(|s| ServiceName::new(s).ok())?;
            Some((service, c))
        })
        .collect();

    let name_width = descriptor
        .services
        .keys()
        .map(|s| s.as_str().len())
        .max()
        .unwrap_or(0)
        .max("SERVICE".len());

    output.progress(&format!("Project: {}", descriptor.project));
    println!("{:<name_width$}  {:<12}  STATUS", "SERVICE", "STATE");
    for service in descriptor.services.keys() {
        match by_service.get(service) {
            Some(container) => println!(
                "{:<name_width$}  {:<12}  {}",
                service.as_str(),
                container.state,
                container.status
            ),
            None => println!("{:<name_width$}  {:<12}  -", service.as_str(), "not created"),
        }
    }

    Ok(())
}
