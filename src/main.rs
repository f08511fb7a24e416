// ABOUTME: Entry point for the flotilla CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::UpArgs;
use flotilla::config::{self, Descriptor};
use flotilla::error::Result;
use flotilla::output::{Output, OutputMode};
use flotilla::runtime::RuntimeConfig;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(output_mode(&cli));
    let runtime_config = RuntimeConfig {
        runtime: cli.runtime,
        socket: cli.socket.clone(),
    };
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { project, force } => {
            config::init_descriptor(&cwd, project.as_deref(), force)
        }
        Commands::Up { pull, force_lock } => {
            let descriptor = load_descriptor(cli.file.as_deref(), &cwd)?;
            commands::up(
                descriptor,
                runtime_config,
                UpArgs { pull, force_lock },
                output,
            )
            .await
        }
        Commands::Down => {
            let descriptor = load_descriptor(cli.file.as_deref(), &cwd)?;
            commands::down(descriptor, runtime_config, output).await
        }
        Commands::Status => {
            let descriptor = load_descriptor(cli.file.as_deref(), &cwd)?;
            commands::status(descriptor, runtime_config, output).await
        }
        Commands::Plan => {
            let descriptor = load_descriptor(cli.file.as_deref(), &cwd)?;
            commands::plan(descriptor, output)
        }
    }
}

fn load_descriptor(file: Option<&Path>, cwd: &Path) -> Result<Descriptor> {
    match file {
        Some(path) => Descriptor::load(path),
        None => Descriptor::discover(cwd),
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    }
}
