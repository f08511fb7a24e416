// ABOUTME: Batch-wise service startup using the type state pattern per launch.
// ABOUTME: Exports the executor, state table, launch states, and up-lock.

mod error;
mod executor;
mod launch;
mod lock;
mod state;
mod table;
mod teardown;
mod transitions;

pub use error::{ExecError, LaunchError};
pub use executor::{UpOptions, UpOutcome, ensure_network, up};
pub use launch::Launch;
pub use lock::{LockError, LockInfo, UpLock};
pub use state::{Finished, ImagePulled, Initialized, Ready, Started};
pub use table::{ServiceRow, ServiceState, StateTable};
pub use teardown::{DownOutcome, down};
