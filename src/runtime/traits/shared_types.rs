// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, ContainerInfo, NetworkConfig, and state enums.

use crate::config::RestartPolicy;
use crate::types::{ContainerId, ImageRef, PortMapping, ServiceName};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Name for the container.
    pub name: String,
    /// Image to run.
    pub image: ImageRef,
    /// Environment variables, already resolved to literal values.
    pub env: BTreeMap<String, String>,
    /// Labels to apply.
    pub labels: BTreeMap<String, String>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Command to run (overrides image CMD).
    pub command: Option<Vec<String>>,
    /// Restart policy.
    pub restart_policy: RestartPolicy,
    /// Healthcheck command registered with the runtime, if any.
    pub healthcheck: Option<HealthcheckSpec>,
    /// Network to connect to.
    pub network: Option<String>,
    /// Aliases in that network. Service names double as aliases so
    /// dependents can resolve each other.
    pub network_aliases: Vec<ServiceName>,
}

/// Healthcheck registered on the container at create time.
#[derive(Debug, Clone)]
pub struct HealthcheckSpec {
    /// Command to run for the check.
    pub test: Vec<String>,
    /// Interval between checks.
    pub interval: Duration,
    /// Timeout for each check.
    pub timeout: Duration,
    /// Retries before unhealthy.
    pub retries: u32,
    /// Start period before checks begin.
    pub start_period: Duration,
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by label (key=value).
    pub labels: BTreeMap<String, String>,
    /// Filter by name (supports partial match).
    pub name: Option<String>,
    /// Include stopped containers.
    pub all: bool,
}

/// Summary information about a container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: ContainerId,
    /// Container name.
    pub name: String,
    /// Image used.
    pub image: String,
    /// Current state.
    pub state: String,
    /// Status message.
    pub status: String,
    /// Labels.
    pub labels: BTreeMap<String, String>,
}

/// Information about a container from inspect.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Container ID.
    pub id: ContainerId,
    /// Container name.
    pub name: String,
    /// Image used.
    pub image: String,
    /// Current state.
    pub state: ContainerState,
    /// Exit code, present once the container has exited.
    pub exit_code: Option<i64>,
    /// Health status (if a healthcheck is registered).
    pub health: Option<HealthState>,
    /// Labels.
    pub labels: BTreeMap<String, String>,
}

/// Container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

/// Health state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Starting,
    Healthy,
    Unhealthy,
    None,
}

/// Configuration for creating a network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name.
    pub name: String,
    /// Network driver (bridge, host, overlay, etc.).
    pub driver: Option<String>,
    /// Labels.
    pub labels: BTreeMap<String, String>,
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    /// Runtime name (e.g., "Docker", "Podman").
    pub name: String,
    /// Runtime version.
    pub version: String,
    /// API version.
    pub api_version: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
}
