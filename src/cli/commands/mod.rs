//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves command-specific arguments against config
//! 2. Calls the engine
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `generate` talks to the forge over the network. Its handler builds a
//! tokio runtime and blocks on the engine, so dispatch stays synchronous.

mod completion;
mod generate;

pub use completion::completion;
pub use generate::{build_options, generate, resolve_project, TOKEN_CONFIG_KEYS, TOKEN_ENV};

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Generate(args) => generate::generate(ctx, &args),
        Command::Completion { shell } => completion::completion(shell),
    }
}
