// ABOUTME: Command module aggregator for the flotilla CLI.
// ABOUTME: Re-exports up, down, status, and plan command handlers.

mod down;
mod plan;
mod runtime_connection;
mod status;
mod up;

pub use down::down;
pub use plan::plan;
pub use status::status;
pub use up::{UpArgs, up};
