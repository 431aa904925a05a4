//! tagscribe - changelogs from tags, issues, and pull requests
//!
//! tagscribe reads a repository's tags, closed issues, and merged pull
//! requests from its forge, attributes each item to the release that first
//! contained the change that resolved it, and renders a markdown changelog
//! grouped by release and by label.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, merges config)
//! - [`engine`] - Tag windowing, attribution, filtering, and classification
//! - [`core`] - Domain types, config, base changelog reading, file output
//! - [`forge`] - Abstraction over the remote forge (GitHub, plus a mock)
//! - [`git`] - Read-only access to the local repository
//! - [`ui`] - Markdown rendering and terminal messages
//!
//! # Correctness Invariants
//!
//! 1. Every item lands in at most one release window and one section
//! 2. Release windows are half-open and never overlap
//! 3. Nothing is written to disk when a run fails

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod git;
pub mod ui;
