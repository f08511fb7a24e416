// ABOUTME: In-memory container runtime for executor tests.
// ABOUTME: Scripts per-container behavior and records the operation order.

use async_trait::async_trait;
use flotilla::runtime::sealed::Sealed;
use flotilla::runtime::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps,
    ContainerState, ContainerSummary, ImageError, ImageOps, NetworkConfig, NetworkError,
    NetworkOps,
};
use flotilla::types::{ContainerId, ImageRef, NetworkId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Scripted behavior for one container, keyed by container name.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Container lands in Exited with this code right after start.
    /// None means it stays Running.
    pub exits_with: Option<i64>,
    /// Health checks fail this many times before passing.
    pub unhealthy_checks: u32,
    /// Health checks never pass.
    pub never_healthy: bool,
    /// create_container fails.
    pub fail_create: bool,
    /// start_container fails (the engine removes the created container).
    pub fail_start: bool,
}

#[derive(Debug, Clone)]
struct FakeContainer {
    name: String,
    image: String,
    state: ContainerState,
    exit_code: Option<i64>,
    labels: BTreeMap<String, String>,
    checks_run: u32,
}

#[derive(Debug, Default)]
struct Inner {
    containers: BTreeMap<String, FakeContainer>,
    networks: BTreeSet<String>,
    behaviors: BTreeMap<String, Behavior>,
    events: Vec<String>,
}

/// An in-memory runtime that records every operation.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    inner: Mutex<Inner>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior of a container (by container name).
    pub fn behave(&self, container_name: &str, behavior: Behavior) {
        self.inner
            .lock()
            .unwrap()
            .behaviors
            .insert(container_name.to_string(), behavior);
    }

    /// Every recorded operation, in order.
    pub fn events(&self) -> Vec<String> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Indices of "start <name>" events, for ordering assertions.
    pub fn start_index(&self, container_name: &str) -> Option<usize> {
        let needle = format!("start {}", container_name);
        self.events().iter().position(|e| e == &needle)
    }

    pub fn network_names(&self) -> Vec<String> {
        self.inner.lock().unwrap().networks.iter().cloned().collect()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.inner.lock().unwrap().containers.keys().cloned().collect()
    }

    /// Pre-seed a container, as if left behind by an earlier run.
    pub fn seed_container(
        &self,
        name: &str,
        image: &str,
        state: ContainerState,
        labels: &[(&str, &str)],
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.containers.insert(
            name.to_string(),
            FakeContainer {
                name: name.to_string(),
                image: image.to_string(),
                state,
                exit_code: None,
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                checks_run: 0,
            },
        );
    }

    fn record(&self, event: String) {
        self.inner.lock().unwrap().events.push(event);
    }
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        self.record(format!("pull {}", reference));
        Ok(())
    }

    async fn image_exists(&self, _reference: &ImageRef) -> Result<bool, ImageError> {
        // Force the engine down the pull path so tests can assert on it
        Ok(false)
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut inner = self.inner.lock().unwrap();
        let behavior = inner.behaviors.get(&config.name).cloned().unwrap_or_default();

        if behavior.fail_create {
            return Err(ContainerError::InvalidConfig(format!(
                "scripted create failure for {}",
                config.name
            )));
        }
        if inner.containers.contains_key(&config.name) {
            return Err(ContainerError::AlreadyExists(config.name.clone()));
        }

        inner.events.push(format!("create {}", config.name));
        inner.containers.insert(
            config.name.clone(),
            FakeContainer {
                name: config.name.clone(),
                image: config.image.to_string(),
                state: ContainerState::Created,
                exit_code: None,
                labels: config.labels.clone(),
                checks_run: 0,
            },
        );

        Ok(ContainerId::new(config.name.clone()))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock().unwrap();
        let behavior = inner.behaviors.get(id.as_str()).cloned().unwrap_or_default();

        if behavior.fail_start {
            return Err(ContainerError::Runtime(format!(
                "scripted start failure for {}",
                id
            )));
        }

        let container = inner
            .containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        // One-shot scripts land directly in Exited; the engine observes the
        // transition via inspect polling.
        match behavior.exits_with {
            Some(code) => {
                container.state = ContainerState::Exited;
                container.exit_code = Some(code);
            }
            None => container.state = ContainerState::Running,
        }

        inner.events.push(format!("start {}", id));
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: std::time::Duration,
    ) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock().unwrap();
        let container = inner
            .containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.state = ContainerState::Exited;
        container.exit_code.get_or_insert(0);
        inner.events.push(format!("stop {}", id));
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .containers
            .remove(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        inner.events.push(format!("remove {}", id));
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let inner = self.inner.lock().unwrap();
        let container = inner
            .containers
            .get(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        Ok(ContainerInfo {
            id: id.clone(),
            name: container.name.clone(),
            image: container.image.clone(),
            state: container.state,
            exit_code: container.exit_code,
            health: None,
            labels: container.labels.clone(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .containers
            .values()
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .filter(|c| filters.all || c.state == ContainerState::Running)
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.name.clone()),
                name: c.name.clone(),
                image: c.image.clone(),
                state: format!("{:?}", c.state).to_lowercase(),
                status: String::new(),
                labels: c.labels.clone(),
            })
            .collect())
    }

    async fn run_healthcheck(
        &self,
        id: &ContainerId,
        _cmd: &[String],
    ) -> Result<bool, ContainerError> {
        let mut inner = self.inner.lock().unwrap();
        let behavior = inner.behaviors.get(id.as_str()).cloned().unwrap_or_default();
        let container = inner
            .containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        container.checks_run += 1;
        let healthy = !behavior.never_healthy && container.checks_run > behavior.unhealthy_checks;
        inner.events.push(format!("healthcheck {}", id));
        Ok(healthy)
    }
}

#[async_trait]
impl NetworkOps for FakeRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.networks.insert(config.name.clone()) {
            return Err(NetworkError::AlreadyExists(config.name.clone()));
        }
        inner.events.push(format!("network {}", config.name));
        Ok(NetworkId::new(config.name.clone()))
    }

    async fn remove_network(&self, id: &NetworkId) -> Result<(), NetworkError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.networks.remove(id.as_str()) {
            return Err(NetworkError::NotFound(id.to_string()));
        }
        inner.events.push(format!("rm-network {}", id));
        Ok(())
    }

    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.inner.lock().unwrap().networks.contains(name))
    }
}
