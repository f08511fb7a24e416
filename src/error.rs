// ABOUTME: Application-wide error types for flotilla.
// ABOUTME: Uses thiserror and maps each taxonomy entry to a distinct exit code.

use crate::graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("descriptor file not found in {0}")]
    DescriptorNotFound(PathBuf),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("startup failed: {0}")]
    Start(String),

    #[error("teardown failed: {0}")]
    Teardown(String),

    #[error("runtime connection failed: {0}")]
    RuntimeConnection(String),

    #[error("status query failed: {0}")]
    Status(String),

    #[error("another up is in progress: {0}")]
    Locked(String),

    #[error("interrupted by operator")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Each validation failure class gets its own code so scripts can tell
    /// a malformed descriptor from a dependency problem without parsing
    /// stderr.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Yaml(_)
            | Error::InvalidDescriptor(_)
            | Error::DescriptorNotFound(_)
            | Error::MissingEnvVar(_) => 2,
            Error::Graph(GraphError::UnresolvedReference { .. }) => 3,
            Error::Graph(GraphError::Cycle { .. }) => 4,
            Error::Start(_) => 5,
            Error::RuntimeConnection(_) => 6,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
