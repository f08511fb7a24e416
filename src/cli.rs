// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use flotilla::runtime::RuntimeType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flotilla")]
#[command(about = "Dependency-ordered startup for local container stacks")]
#[command(version)]
pub struct Cli {
    /// Descriptor file (defaults to flotilla.yml in the working directory)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Container runtime (overrides auto-detection)
    #[arg(long, global = true, value_enum)]
    pub runtime: Option<RuntimeType>,

    /// Runtime socket path (overrides the default for the runtime)
    #[arg(long, global = true)]
    pub socket: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new flotilla.yml descriptor
    Init {
        /// Project name for the generated descriptor
        #[arg(long)]
        project: Option<String>,

        /// Overwrite an existing descriptor
        #[arg(long)]
        force: bool,
    },

    /// Start the project: validate, schedule, and execute in dependency order
    Up {
        /// Pull images even when they exist locally
        #[arg(long)]
        pull: bool,

        /// Break an existing up lock
        #[arg(long)]
        force_lock: bool,
    },

    /// Stop the project in reverse dependency order
    Down,

    /// Show per-service container state
    Status,

    /// Print the computed start batches without executing
    Plan,
}
