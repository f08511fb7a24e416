// ABOUTME: Down command implementation.
// ABOUTME: Stops and removes the project in reverse dependency order.

use super::runtime_connection::connect_to_runtime;
use flotilla::config::Descriptor;
use flotilla::error::{Error, Result};
use flotilla::graph::DependencyGraph;
use flotilla::orchestrate;
use flotilla::output::Output;
use flotilla::runtime::RuntimeConfig;

/// Stop the project's containers, newest dependents first.
pub async fn down(
    descriptor: Descriptor,
    runtime_config: RuntimeConfig,
    mut output: Output,
) -> Result<()> {
    let graph = DependencyGraph::build(&descriptor)?;
    let schedule = graph.schedule();

    output.start_timer();
    output.progress(&format!("Taking down {}", descriptor.project));

    let runtime = connect_to_runtime(&runtime_config).await?;

    let outcome = orchestrate::down(&runtime, &descriptor, &schedule, &output)
        .await
        .map_err(|e| Error::Teardown(e.to_string()))?;

    if outcome.success() {
        output.success(&format!(
            "Project {} is down ({} container(s) removed)",
            descriptor.project,
            outcome.stopped.len() + outcome.orphans.len()
        ));
        Ok(())
    } else {
        for (container, error) in &outcome.failures {
            output.error(&format!("{}: {}", container, error));
        }
        Err(Error::Teardown(format!(
            "{} container(s) could not be removed",
            outcome.failures.len()
        )))
    }
}
