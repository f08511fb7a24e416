// ABOUTME: Shared runtime connection helper for command handlers.
// ABOUTME: Detects the local socket, connects, and pings to fail fast.

use flotilla::error::{Error, Result};
use flotilla::runtime::{
    BollardRuntime, RuntimeConfig, RuntimeErrorKind, RuntimeInfo, connect_local,
};

/// Detect the local runtime socket, connect, and verify the daemon answers.
pub async fn connect_to_runtime(config: &RuntimeConfig) -> Result<BollardRuntime> {
    let runtime = connect_local(Some(config)).map_err(|e| match e.kind() {
        RuntimeErrorKind::NoRuntimeFound => Error::RuntimeConnection(
            "no container runtime found; is Docker or Podman running?".to_string(),
        ),
        _ => Error::RuntimeConnection(e.to_string()),
    })?;

    tracing::debug!(runtime = %runtime.runtime_type(), "connected to container runtime");

    runtime
        .ping()
        .await
        .map_err(|e| Error::RuntimeConnection(e.to_string()))?;

    Ok(runtime)
}
