//! cli
//!
//! Command-line interface layer for tagscribe.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, merges them with the
//! config files, and hands a fully resolved [`crate::engine::GeneratorOptions`]
//! to the engine. Errors cross this boundary as `anyhow::Error`.

pub mod args;
pub mod commands;

pub use args::{Cli, GenerateArgs, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Per-invocation settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory the command runs in.
    pub cwd: PathBuf,
    /// How chatty user-facing output is.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.log_level());

    let cwd = match cli.cwd.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to determine the current directory")?,
    };
    let ctx = Context {
        cwd,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug || cli.verbose > 0),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
