// ABOUTME: State transition methods for a single service launch.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::marker::PhantomData;
use std::time::Duration;

use crate::config::resolve_env_map;
use crate::runtime::{ContainerConfig, ContainerOps, ContainerState, HealthcheckSpec, ImageOps};
use crate::types::ContainerId;

use super::Launch;
use super::error::LaunchError;
use super::state::{Finished, ImagePulled, Initialized, Ready, Started};

/// How often readiness polling re-inspects a container.
const INSPECT_INTERVAL: Duration = Duration::from_millis(500);

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Launch<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self) -> Launch<T> {
        Launch {
            project: self.project,
            service: self.service,
            spec: self.spec,
            network: self.network,
            ready_timeout: self.ready_timeout,
            container: self.container,
            _state: PhantomData,
        }
    }

    /// Internal helper to transition with a container ID.
    fn transition_with_container<T>(self, container_id: ContainerId) -> Launch<T> {
        Launch {
            project: self.project,
            service: self.service,
            spec: self.spec,
            network: self.network,
            ready_timeout: self.ready_timeout,
            container: Some(container_id),
            _state: PhantomData,
        }
    }

    /// Container name for this launch: `<project>-<service>`.
    pub fn container_name(&self) -> String {
        format!("{}-{}", self.project, self.service)
    }
}

// =============================================================================
// Initialized -> ImagePulled
// =============================================================================

impl Launch<Initialized> {
    /// Make the image available locally, pulling unless it already exists
    /// (or `force_pull` is set).
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::ImagePullFailed` if the image cannot be pulled.
    #[must_use = "launch state must be used"]
    pub async fn pull_image<R: ImageOps>(
        self,
        runtime: &R,
        force_pull: bool,
    ) -> Result<Launch<ImagePulled>, LaunchError> {
        let present = !force_pull && runtime.image_exists(&self.spec.image).await?;
        if !present {
            runtime.pull_image(&self.spec.image).await?;
        }
        Ok(self.transition())
    }
}

// =============================================================================
// ImagePulled -> Started
// =============================================================================

impl Launch<ImagePulled> {
    /// Create and start the container.
    ///
    /// # Errors
    ///
    /// Returns error if environment resolution, container creation, or
    /// start fails. A created-but-unstartable container is removed.
    #[must_use = "launch state must be used"]
    pub async fn start_container<R: ContainerOps>(
        self,
        runtime: &R,
    ) -> Result<Launch<Started>, LaunchError> {
        let config = self.build_container_config()?;
        let container_id = runtime.create_container(&config).await?;

        if let Err(e) = runtime.start_container(&container_id).await {
            // Clean up the created container on start failure
            let _ = runtime.remove_container(&container_id, true).await;
            return Err(LaunchError::ContainerStartFailed(e.to_string()));
        }

        Ok(self.transition_with_container(container_id))
    }

    /// Build container configuration from the service spec.
    fn build_container_config(&self) -> Result<ContainerConfig, LaunchError> {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert("flotilla.project".to_string(), self.project.to_string());
        labels.insert("flotilla.service".to_string(), self.service.to_string());
        labels.insert("flotilla.managed".to_string(), "true".to_string());
        if self.spec.one_shot {
            labels.insert("flotilla.one-shot".to_string(), "true".to_string());
        }

        let env = resolve_env_map(&self.spec.env)
            .map_err(|e| LaunchError::EnvResolutionFailed(e.to_string()))?;

        // Register the healthcheck with the runtime too, so `status` shows
        // health after the engine has moved on.
        let healthcheck = self.spec.healthcheck.as_ref().map(|hc| HealthcheckSpec {
            test: vec!["CMD-SHELL".to_string(), hc.cmd.clone()],
            interval: hc.interval,
            timeout: hc.timeout,
            retries: hc.retries,
            start_period: hc.start_period,
        });

        // The service name is the network alias for discovery
        let network_aliases = vec![self.service.clone()];

        Ok(ContainerConfig {
            name: self.container_name(),
            image: self.spec.image.clone(),
            env,
            labels,
            ports: self.spec.ports.clone(),
            command: self.spec.command.clone(),
            restart_policy: self.spec.restart.clone(),
            healthcheck,
            network: Some(self.network.clone()),
            network_aliases,
        })
    }
}

// =============================================================================
// Started -> Ready
// =============================================================================

impl Launch<Started> {
    /// Wait until the service counts as ready for its dependents: the
    /// declared health check passes, or (without one) the container reaches
    /// Running.
    ///
    /// The engine actively triggers health checks rather than waiting for
    /// the runtime to run them, because some runtimes (e.g. rootless Podman
    /// without systemd) never execute registered check commands.
    ///
    /// # Errors
    ///
    /// Returns `ReadyTimeout` when `ready_timeout` elapses,
    /// `HealthCheckFailed` when retries are exhausted, and
    /// `ExitedDuringStartup` when the container dies while we wait.
    #[must_use = "launch state must be used"]
    pub async fn await_ready<R: ContainerOps>(
        self,
        runtime: &R,
    ) -> Result<Launch<Ready>, LaunchError> {
        if self.spec.healthcheck.is_some() {
            return self.poll_healthcheck(runtime).await;
        }

        let container = self
            .container
            .as_ref()
            .expect("started launch has a container");
        let deadline = self.ready_timeout;
        let start = std::time::Instant::now();

        while start.elapsed() < deadline {
            let info = runtime
                .inspect_container(container)
                .await
                .map_err(|e| LaunchError::InspectFailed(e.to_string()))?;

            match info.state {
                ContainerState::Running => return Ok(self.transition()),
                ContainerState::Exited | ContainerState::Dead => {
                    return Err(LaunchError::ExitedDuringStartup(
                        info.exit_code.unwrap_or(-1),
                    ));
                }
                _ => tokio::time::sleep(INSPECT_INTERVAL).await,
            }
        }

        Err(LaunchError::ReadyTimeout(deadline.as_secs()))
    }

    async fn poll_healthcheck<R: ContainerOps>(
        self,
        runtime: &R,
    ) -> Result<Launch<Ready>, LaunchError> {
        let container = self
            .container
            .as_ref()
            .expect("started launch has a container");
        let healthcheck = self
            .spec
            .healthcheck
            .as_ref()
            .expect("poll_healthcheck requires a healthcheck");

        // Build the healthcheck command: ["sh", "-c", cmd]
        let healthcheck_cmd = vec!["sh".to_string(), "-c".to_string(), healthcheck.cmd.clone()];

        let start = std::time::Instant::now();
        let poll_interval = healthcheck.interval;
        let mut retries_remaining = healthcheck.retries;

        // Wait for start period before beginning health checks
        if healthcheck.start_period > Duration::ZERO {
            tokio::time::sleep(healthcheck.start_period).await;
        }

        while start.elapsed() < self.ready_timeout {
            let healthcheck_result = tokio::time::timeout(
                healthcheck.timeout,
                runtime.run_healthcheck(container, &healthcheck_cmd),
            )
            .await;

            match healthcheck_result {
                Ok(Ok(true)) => {
                    // Healthy
                    return Ok(self.transition());
                }
                Ok(Ok(false)) => {
                    // Unhealthy - decrement retries
                    if retries_remaining == 0 {
                        return Err(LaunchError::HealthCheckFailed(
                            "container reported unhealthy after retries exhausted".to_string(),
                        ));
                    }
                    retries_remaining -= 1;
                }
                Ok(Err(e)) => {
                    // Error running healthcheck - treat as unhealthy
                    if retries_remaining == 0 {
                        return Err(LaunchError::HealthCheckFailed(format!(
                            "healthcheck exec failed: {}",
                            e
                        )));
                    }
                    retries_remaining -= 1;
                }
                Err(_elapsed) => {
                    // Timeout - treat as unhealthy
                    if retries_remaining == 0 {
                        return Err(LaunchError::HealthCheckFailed(
                            "healthcheck timeout after retries exhausted".to_string(),
                        ));
                    }
                    retries_remaining -= 1;
                }
            }

            tokio::time::sleep(poll_interval).await;
        }

        Err(LaunchError::ReadyTimeout(self.ready_timeout.as_secs()))
    }

    /// Wait for a one-shot service to run to completion.
    ///
    /// # Errors
    ///
    /// Returns `OneShotFailed` on nonzero exit and `ReadyTimeout` when the
    /// service is still running at the deadline.
    #[must_use = "launch state must be used"]
    pub async fn await_exit<R: ContainerOps>(
        self,
        runtime: &R,
    ) -> Result<Launch<Finished>, LaunchError> {
        let container = self
            .container
            .as_ref()
            .expect("started launch has a container");

        let start = std::time::Instant::now();

        while start.elapsed() < self.ready_timeout {
            let info = runtime
                .inspect_container(container)
                .await
                .map_err(|e| LaunchError::InspectFailed(e.to_string()))?;

            match info.state {
                ContainerState::Exited => {
                    let code = info.exit_code.unwrap_or(0);
                    if code == 0 {
                        return Ok(self.transition());
                    }
                    return Err(LaunchError::OneShotFailed(code));
                }
                ContainerState::Dead => {
                    return Err(LaunchError::OneShotFailed(info.exit_code.unwrap_or(-1)));
                }
                _ => tokio::time::sleep(INSPECT_INTERVAL).await,
            }
        }

        Err(LaunchError::ReadyTimeout(self.ready_timeout.as_secs()))
    }
}

// =============================================================================
// Terminal States
// =============================================================================

impl Launch<Ready> {
    /// The running container backing this service.
    pub fn running_container(&self) -> &ContainerId {
        self.container
            .as_ref()
            .expect("ready launch has a container")
    }
}

impl Launch<Finished> {
    /// The exited container left behind by the one-shot run.
    pub fn exited_container(&self) -> &ContainerId {
        self.container
            .as_ref()
            .expect("finished launch has a container")
    }
}
