// ABOUTME: Error types for launch transitions and the batch executor.
// ABOUTME: Covers image pull, container, readiness, and one-shot exit failures.

use crate::runtime::{ContainerError, ImageError, NetworkError};
use crate::types::ServiceName;

/// Errors that can occur during a single service's launch transitions.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Image pull failed.
    #[error("failed to pull image: {0}")]
    ImagePullFailed(String),

    /// Container creation failed.
    #[error("failed to create container: {0}")]
    ContainerCreateFailed(String),

    /// Container start failed.
    #[error("failed to start container: {0}")]
    ContainerStartFailed(String),

    /// Health check reported unhealthy after retries were exhausted.
    #[error("health check failed: {0}")]
    HealthCheckFailed(String),

    /// Service did not reach readiness within the configured bound.
    #[error("service not ready after {0} seconds")]
    ReadyTimeout(u64),

    /// A long-running service exited while we waited for it to come up.
    #[error("service exited during startup with code {0}")]
    ExitedDuringStartup(i64),

    /// A one-shot service exited nonzero.
    #[error("one-shot service exited with code {0}")]
    OneShotFailed(i64),

    /// Runtime reported an unexpected error while inspecting the container.
    #[error("failed to inspect container: {0}")]
    InspectFailed(String),

    /// An `env:` reference could not be resolved from the process
    /// environment.
    #[error("environment resolution failed: {0}")]
    EnvResolutionFailed(String),
}

impl From<ImageError> for LaunchError {
    fn from(err: ImageError) -> Self {
        LaunchError::ImagePullFailed(err.to_string())
    }
}

impl From<ContainerError> for LaunchError {
    fn from(err: ContainerError) -> Self {
        LaunchError::ContainerCreateFailed(err.to_string())
    }
}

/// Errors that abort the batch executor as a whole.
///
/// Per-service failures are not in here: those are recorded in the state
/// table and reported in the outcome, while unrelated subtrees continue.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// Project network could not be created.
    #[error("failed to create network: {0}")]
    NetworkFailed(String),

    /// Operator-initiated abort.
    #[error("startup interrupted")]
    Interrupted,

    /// A service name in the schedule has no spec. Graph and schedule are
    /// both derived from the descriptor, so this is a programming error.
    #[error("unknown service in schedule: {0}")]
    UnknownService(ServiceName),

    /// Runtime reported an error outside any single service's launch.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<NetworkError> for ExecError {
    fn from(err: NetworkError) -> Self {
        ExecError::NetworkFailed(err.to_string())
    }
}
