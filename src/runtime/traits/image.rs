// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Pull and check existence of container images.

use super::sealed::Sealed;
use crate::types::ImageRef;
use async_trait::async_trait;

/// Image operations: pull and check existence.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Pull an image from a registry.
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    /// Check if an image exists locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
