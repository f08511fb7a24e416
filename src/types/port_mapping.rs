// ABOUTME: Validated host-to-container port mapping.
// ABOUTME: Parses formats like "8080:80" and "9092:9092/udp".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParsePortMappingError {
    #[error("port mapping must be a host:container pair, got: {0}")]
    NotAPair(String),

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
}

/// Network protocol for a published port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// A host-to-container port mapping.
///
/// The descriptor writes these as `"host:container"` strings with an
/// optional `/udp` suffix; anything else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host_port: u16,
    pub container_port: u16,
    pub protocol: Protocol,
}

impl FromStr for PortMapping {
    type Err = ParsePortMappingError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (ports, protocol) = match spec.split_once('/') {
            Some((ports, proto)) => match proto {
                "tcp" => (ports, Protocol::Tcp),
                "udp" => (ports, Protocol::Udp),
                other => return Err(ParsePortMappingError::UnknownProtocol(other.to_string())),
            },
            None => (spec, Protocol::Tcp),
        };

        let (host, container) = ports
            .split_once(':')
            .ok_or_else(|| ParsePortMappingError::NotAPair(spec.to_string()))?;

        if container.contains(':') {
            return Err(ParsePortMappingError::NotAPair(spec.to_string()));
        }

        let host_port = host
            .parse::<u16>()
            .map_err(|_| ParsePortMappingError::InvalidPort(host.to_string()))?;
        let container_port = container
            .parse::<u16>()
            .map_err(|_| ParsePortMappingError::InvalidPort(container.to_string()))?;

        Ok(Self {
            host_port,
            container_port,
            protocol,
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)?;
        if self.protocol == Protocol::Udp {
            write!(f, "/udp")?;
        }
        Ok(())
    }
}

impl Serialize for PortMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
