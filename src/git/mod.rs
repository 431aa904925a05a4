//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the only doorway to Git. No other module imports `git2`.
//! Access is read-only and goes through libgit2 (no shelling out to the git
//! CLI).
//!
//! # Responsibilities
//!
//! - Repository discovery from the working directory
//! - Config lookups (the API token keys)
//! - Remote URL lookups (project discovery)
//!
//! # Example
//!
//! ```ignore
//! use tagscribe::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let token = git.config_string("github.tagscribe.token")?;
//! let url = git.remote_url("origin")?;
//! ```

mod interface;

pub use interface::{global_config_string, Git, GitError};
