// ABOUTME: Up command implementation.
// ABOUTME: Validates, schedules, locks, and runs the batch executor.

use std::sync::Arc;

use super::runtime_connection::connect_to_runtime;
use flotilla::config::Descriptor;
use flotilla::diagnostics::Diagnostics;
use flotilla::error::{Error, Result};
use flotilla::graph::DependencyGraph;
use flotilla::orchestrate::{self, ExecError, StateTable, UpLock, UpOptions};
use flotilla::output::Output;
use flotilla::runtime::RuntimeConfig;
use flotilla::status::StatusReporter;
use tokio::sync::watch;

/// Flags for the up command.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpArgs {
    pub pull: bool,
    pub force_lock: bool,
}

/// Parse, validate, schedule, and execute the descriptor.
pub async fn up(
    descriptor: Descriptor,
    runtime_config: RuntimeConfig,
    args: UpArgs,
    mut output: Output,
) -> Result<()> {
    // Graph and schedule are computed before anything touches the runtime,
    // so validation errors have no side effects.
    let graph = DependencyGraph::build(&descriptor)?;
    let schedule = graph.schedule();

    output.start_timer();
    output.progress(&format!(
        "Bringing up {} ({} service(s) in {} batch(es))",
        descriptor.project,
        graph.len(),
        schedule.len()
    ));

    let _lock = UpLock::acquire(&descriptor.project, args.force_lock)
        .map_err(|e| Error::Locked(e.to_string()))?;

    let runtime = connect_to_runtime(&runtime_config).await?;

    let table = Arc::new(StateTable::new(graph.services().cloned()));
    let reporter = StatusReporter::new(Arc::clone(&table));

    // Ctrl-C flips the cancel channel; the executor stops issuing batches
    // and stops what it already started.
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let mut diag = Diagnostics::default();
    let options = UpOptions {
        force_pull: args.pull,
    };

    let outcome = orchestrate::up(
        &runtime,
        &descriptor,
        &graph,
        &schedule,
        &table,
        &mut cancel_rx,
        &options,
        &output,
        &mut diag,
    )
    .await
    .map_err(|e| match e {
        ExecError::Interrupted => Error::Interrupted,
        other => Error::Start(other.to_string()),
    })?;

    for line in reporter.render_lines() {
        output.progress(&line);
    }

    for warning in diag.warnings() {
        output.warn(&warning.message);
    }

    if outcome.success() {
        output.success(&format!("Project {} is up", descriptor.project));
        Ok(())
    } else {
        if !outcome.blocked.is_empty() {
            let blocked: Vec<&str> = outcome.blocked.iter().map(|s| s.as_str()).collect();
            output.error(&format!("never started (blocked): {}", blocked.join(", ")));
        }
        Err(Error::Start(format!(
            "{} service(s) failed to start",
            outcome.failures.len()
        )))
    }
}
