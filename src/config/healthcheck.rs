// ABOUTME: Service readiness check configuration.
// ABOUTME: Defines a command-based health check with polling defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A command-based readiness probe, run inside the container.
///
/// Exit code 0 means healthy. The engine execs the command itself rather
/// than relying on the daemon's scheduler, so checks behave identically on
/// Docker and rootless Podman.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcheckConfig {
    pub cmd: String,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_start_period", with = "humantime_serde")]
    pub start_period: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

fn default_start_period() -> Duration {
    Duration::from_secs(30)
}
