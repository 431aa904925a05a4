//! forge
//!
//! Abstraction for remote forges that host issues, pull requests, and tags.
//!
//! # Architecture
//!
//! The `Forge` trait defines the read-only interface the changelog engine
//! needs. The engine only ever sees `&dyn Forge`, so tests drive it with
//! [`mock::MockForge`] and the binary with [`github::GitHubForge`].
//!
//! - Every listing is paginated; callers walk pages in sequence
//! - Forge failures are typed ([`ForgeError`]) so rate limiting can be told
//!   apart from other API errors
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait, [`Page`], and error types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use tagscribe::forge::github::GitHubForge;
//! use tagscribe::forge::Forge;
//!
//! let forge = GitHubForge::new(token, "octocat", "hello-world");
//! let repo = forge.get_repo().await?;
//! println!("created at {}", repo.created_at);
//! ```

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
