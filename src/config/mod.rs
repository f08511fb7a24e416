// ABOUTME: Descriptor types and parsing for flotilla.yml.
// ABOUTME: Handles YAML parsing, service specs, and descriptor discovery.

mod env_value;
mod healthcheck;
mod restart_policy;

pub use env_value::{EnvValue, resolve_env_map};
pub use healthcheck::HealthcheckConfig;
pub use restart_policy::RestartPolicy;

use crate::error::{Error, Result};
use crate::types::{ImageRef, PortMapping, ServiceName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DESCRIPTOR_FILENAME: &str = "flotilla.yml";
pub const DESCRIPTOR_FILENAME_ALT: &str = "flotilla.yaml";
pub const DESCRIPTOR_FILENAME_DIR: &str = ".flotilla/config.yml";

/// A parsed deployment descriptor: one project, many services.
///
/// Services live in a `BTreeMap` so every iteration over them is ordered by
/// name, which keeps logs and schedules reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default = "default_project")]
    pub project: ServiceName,

    /// Upper bound on each service's readiness wait.
    #[serde(default = "default_ready_timeout", with = "humantime_serde")]
    pub ready_timeout: Duration,

    pub services: BTreeMap<ServiceName, ServiceSpec>,
}

/// One declared service: an image plus its runtime parameters.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortMapping>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, EnvValue>,

    /// Names of services that must be Running (or Healthy) before this one
    /// starts. Order is preserved as written but has no semantic weight.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ServiceName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthcheckConfig>,

    /// A one-shot service runs to completion instead of staying up.
    /// Exit code 0 counts as success for dependents.
    #[serde(default, skip_serializing_if = "is_false")]
    pub one_shot: bool,

    /// A best-effort service's failure is recorded but does not block
    /// services depending on it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub best_effort: bool,

    #[serde(default, skip_serializing_if = "is_default_restart")]
    pub restart: RestartPolicy,
}

fn default_project() -> ServiceName {
    ServiceName::new("flotilla").expect("default project name is valid")
}

fn default_ready_timeout() -> Duration {
    Duration::from_secs(120)
}

fn is_false(b: &bool) -> bool {
    !b
}

fn is_default_restart(r: &RestartPolicy) -> bool {
    *r == RestartPolicy::No
}

impl Descriptor {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    /// Re-serialize the descriptor. Parsing the output again yields an
    /// identical service mapping.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(DESCRIPTOR_FILENAME),
            dir.join(DESCRIPTOR_FILENAME_ALT),
            dir.join(DESCRIPTOR_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::DescriptorNotFound(dir.to_path_buf()))
    }

    /// Network every container of this project joins. Each container gets
    /// its service name as an alias, so dependents resolve peers by name.
    pub fn network_name(&self) -> String {
        self.project.to_string()
    }

    /// Container name for a service of this project.
    pub fn container_name(&self, service: &ServiceName) -> String {
        format!("{}-{}", self.project, service)
    }

    pub fn spec(&self, service: &ServiceName) -> Option<&ServiceSpec> {
        self.services.get(service)
    }
}

pub fn init_descriptor(dir: &Path, project: Option<&str>, force: bool) -> Result<()> {
    let path = dir.join(DESCRIPTOR_FILENAME);

    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    let project = match project {
        Some(p) => {
            ServiceName::new(p).map_err(|e| Error::InvalidDescriptor(e.to_string()))?
        }
        None => default_project(),
    };

    std::fs::write(&path, template_yaml(&project))?;

    Ok(())
}

fn template_yaml(project: &ServiceName) -> String {
    format!(
        r#"project: {}

services:
  db:
    image: postgres:16
    env:
      POSTGRES_PASSWORD: example

  web:
    image: my-registry/my-app:latest
    ports:
      - "8080:80"
    depends_on:
      - db

  seed:
    image: my-registry/my-app:latest
    command: ["./seed-db"]
    one_shot: true
    depends_on:
      - db
"#,
        project
    )
}

// Custom deserializers

fn deserialize_image_ref<'de, D>(deserializer: D) -> std::result::Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}
