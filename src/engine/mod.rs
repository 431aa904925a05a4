//! engine
//!
//! The tag-windowing and issue-attribution engine.
//!
//! # Architecture
//!
//! A generation run flows through these stages, each its own module:
//!
//! 1. **Fetch** ([`fetch`]): tags, closed items, merged pull requests, and
//!    per-item event histories from the forge
//! 2. **Resolve** ([`resolver`]): tags to instants, memoized per run
//! 3. **Filter tags** ([`tag_filter`]): since / between / due / exclude
//! 4. **Filter items** ([`item_filter`]): kinds, labels, merged join
//! 5. **Attribute** ([`attribution`]): the instant each item was resolved
//! 6. **Partition** ([`window`]): items into release windows, with the
//!    milestone override
//! 7. **Classify** ([`sections`]): window items into labeled sections
//!
//! [`generator`] wires the stages together and hands the result to
//! `ui::markdown`.
//!
//! # Invariants
//!
//! - All per-run state lives in a [`RunContext`]; there is no global cache
//! - An item appears in at most one window and one section within it
//! - Windows are half-open `(older, newer]` and never overlap
//! - Rate limiting aborts the run with [`GeneratorError::RateLimitExceeded`]
//!
//! # Example
//!
//! ```ignore
//! use tagscribe::engine::{generate, GeneratorOptions};
//! use tagscribe::forge::github::GitHubForge;
//!
//! let forge = GitHubForge::new(token, "octocat", "hello-world");
//! let changelog = generate(&forge, &GeneratorOptions::default()).await?;
//! println!("{}", changelog.text);
//! ```

pub mod attribution;
pub mod context;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod item_filter;
pub mod options;
pub mod resolver;
pub mod sections;
pub mod tag_filter;
pub mod window;

// Re-exports for convenience
pub use context::{RunContext, DEFAULT_MAX_CONCURRENT_REQUESTS};
pub use error::GeneratorError;
pub use generator::{generate, generate_with_context, Changelog};
pub use options::{GeneratorOptions, DEFAULT_UNRELEASED_LABEL};
pub use resolver::{TagTimeCache, TemporalResolver, TimedTag};
pub use sections::{default_sections, Section};
