// ABOUTME: Network operations trait for container runtimes.
// ABOUTME: Create and remove project networks.

use super::sealed::Sealed;
use super::shared_types::NetworkConfig;
use crate::types::NetworkId;
use async_trait::async_trait;

/// Network operations: create, remove, existence check.
#[async_trait]
pub trait NetworkOps: Sealed + Send + Sync {
    /// Create a network.
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    /// Remove a network.
    async fn remove_network(&self, id: &NetworkId) -> Result<(), NetworkError>;

    /// Check if a network exists.
    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network not found: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("network in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
