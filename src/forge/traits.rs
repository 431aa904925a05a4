//! forge::traits
//!
//! Forge trait definition for reading release history from a hosting service.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` to handle API errors gracefully.
//!
//! Listing methods are paginated: each call returns one [`Page`] and the
//! index of the next page, if any. Callers walk pages strictly in sequence
//! for a single resource; distinct resources may be walked concurrently.
//!
//! # Example
//!
//! ```ignore
//! use tagscribe::forge::{Forge, ForgeError};
//!
//! async fn count_tags(forge: &dyn Forge) -> Result<usize, ForgeError> {
//!     let mut total = 0;
//!     let mut page = Some(1);
//!     while let Some(n) = page {
//!         let result = forge.list_tags(n).await?;
//!         total += result.items.len();
//!         page = result.next_page;
//!     }
//!     Ok(total)
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{Commit, Event, Item, RepoInfo, Tag};

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with remote hosting services like GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Index of the next page, `None` at the end of data.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// The final page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

/// A closed pull request from the pulls listing.
///
/// The issues listing does not carry merge information, so pull requests
/// are joined with this summary by number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub number: u64,
    /// Raw `merged_at`; `None` when closed without merging.
    pub merged_at: Option<String>,
}

/// The Forge trait for reading a repository's release history.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `RateLimited`: Abort and advise the user to supply a token
/// - `NotFound`: Resource doesn't exist
/// - `ApiError`: Display error message to user
/// - `NetworkError`: Check connectivity
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// List one page of repository tags, newest first as the forge orders them.
    async fn list_tags(&self, page: u32) -> Result<Page<Tag>, ForgeError>;

    /// List one page of closed issues and pull requests.
    ///
    /// Pull requests appear here as items of kind `PullRequest` without
    /// `merged_at`; see [`Forge::list_closed_pull_requests`].
    async fn list_closed_issues(&self, page: u32) -> Result<Page<Item>, ForgeError>;

    /// List one page of closed pull requests, optionally limited to a base branch.
    async fn list_closed_pull_requests(
        &self,
        page: u32,
        base: Option<&str>,
    ) -> Result<Page<PullRequestSummary>, ForgeError>;

    /// Get a commit by SHA.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the commit doesn't exist (e.g. it lives in a fork)
    async fn get_commit(&self, sha: &str) -> Result<Commit, ForgeError>;

    /// Get repository metadata.
    async fn get_repo(&self) -> Result<RepoInfo, ForgeError>;

    /// List one page of an issue's events, in occurrence order.
    async fn list_issue_events(&self, number: u64, page: u32) -> Result<Page<Event>, ForgeError>;
}
