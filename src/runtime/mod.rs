// ABOUTME: Container runtime backend: capability traits plus the bollard client.
// ABOUTME: Auto-detects the local Docker or Podman socket.

mod bollard;
mod detection;
mod error;
mod traits;
mod types;

pub use bollard::{BollardRuntime, connect_local};
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::*;
pub use types::{RuntimeConfig, RuntimeSocket, RuntimeType};
