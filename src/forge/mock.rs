//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It stores tags, commits, items, and event histories in
//! memory, paginates them with a configurable page size, records every call,
//! and allows configuring failure scenarios.
//!
//! # Example
//!
//! ```
//! use tagscribe::core::types::Item;
//! use tagscribe::forge::mock::MockForge;
//! use tagscribe::forge::Forge;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forge = MockForge::new()
//!     .with_repo_created_at("2015-01-01T00:00:00Z")
//!     .with_tag("v1.0", "aaa", "2015-02-01T00:00:00Z")
//!     .with_item(Item::issue(1, "Crash on start"));
//!
//! let tags = forge.list_tags(1).await.unwrap();
//! assert_eq!(tags.items[0].name, "v1.0");
//!
//! let commit = forge.get_commit("aaa").await.unwrap();
//! assert_eq!(commit.committer_date.as_deref(), Some("2015-02-01T00:00:00Z"));
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{Forge, ForgeError, Page, PullRequestSummary};
use crate::core::types::{Commit, Event, Item, RepoInfo, Tag};

/// Default number of records per page.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    /// Tags in listing order.
    tags: Vec<Tag>,
    /// Commits by SHA.
    commits: HashMap<String, Commit>,
    /// Closed issues and pull requests in listing order (without events).
    items: Vec<Item>,
    /// Event histories by item number.
    events: HashMap<u64, Vec<Event>>,
    /// Closed pull requests with their base branch.
    pulls: Vec<(PullRequestSummary, String)>,
    /// Repository metadata.
    repo: Option<RepoInfo>,
    /// Records per page.
    page_size: usize,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list_tags with the given error.
    ListTags(ForgeError),
    /// Fail list_closed_issues with the given error.
    ListClosedIssues(ForgeError),
    /// Fail list_closed_pull_requests with the given error.
    ListClosedPullRequests(ForgeError),
    /// Fail get_commit with the given error.
    GetCommit(ForgeError),
    /// Fail get_repo with the given error.
    GetRepo(ForgeError),
    /// Fail list_issue_events with the given error.
    ListIssueEvents(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListTags { page: u32 },
    ListClosedIssues { page: u32 },
    ListClosedPullRequests { page: u32, base: Option<String> },
    GetCommit { sha: String },
    GetRepo,
    ListIssueEvents { number: u64, page: u32 },
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                tags: Vec::new(),
                commits: HashMap::new(),
                items: Vec::new(),
                events: HashMap::new(),
                pulls: Vec::new(),
                repo: None,
                page_size: DEFAULT_PAGE_SIZE,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the repository creation timestamp (raw).
    pub fn with_repo_created_at(self, created_at: &str) -> Self {
        self.state().repo = Some(RepoInfo {
            created_at: created_at.to_string(),
        });
        self
    }

    /// Add a tag whose commit has the given committer date (raw).
    pub fn with_tag(self, name: &str, sha: &str, committer_date: &str) -> Self {
        {
            let mut state = self.state();
            state.tags.push(Tag::release(name, sha));
            state
                .commits
                .entry(sha.to_string())
                .or_insert_with(|| Commit {
                    sha: sha.to_string(),
                    author_date: None,
                    committer_date: Some(committer_date.to_string()),
                });
        }
        self
    }

    /// Add or replace a commit.
    pub fn with_commit(
        self,
        sha: &str,
        author_date: Option<&str>,
        committer_date: Option<&str>,
    ) -> Self {
        self.state().commits.insert(
            sha.to_string(),
            Commit {
                sha: sha.to_string(),
                author_date: author_date.map(str::to_string),
                committer_date: committer_date.map(str::to_string),
            },
        );
        self
    }

    /// Add a closed item.
    ///
    /// The item's events become its event history; the listing returns the
    /// item without events and without `merged_at`, as the real API does.
    /// A pull request carrying `merged_at` is also registered as merged in
    /// the pulls listing against base `main`.
    pub fn with_item(self, mut item: Item) -> Self {
        {
            let mut state = self.state();
            let events = std::mem::take(&mut item.events);
            state.events.insert(item.number, events);
            if item.is_pull_request() {
                let summary = PullRequestSummary {
                    number: item.number,
                    merged_at: item.merged_at.map(|at| at.to_rfc3339()),
                };
                state.pulls.push((summary, "main".to_string()));
            }
            item.merged_at = None;
            item.resolved_at = None;
            state.items.push(item);
        }
        self
    }

    /// Add a closed pull request to the pulls listing.
    pub fn with_pull(self, number: u64, merged_at: Option<&str>, base: &str) -> Self {
        self.state().pulls.push((
            PullRequestSummary {
                number,
                merged_at: merged_at.map(str::to_string),
            },
            base.to_string(),
        ));
        self
    }

    /// Set the number of records per page.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state().page_size = page_size.max(1);
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Clear any configured failure.
    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// Get recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Number of `get_commit` calls made for `sha`.
    pub fn commit_lookups(&self, sha: &str) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::GetCommit { sha: s } if s == sha))
            .count()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Record an operation and return the configured failure for it, if any.
    fn record(&self, op: MockOperation) -> Result<(), ForgeError> {
        let mut state = self.state();
        let failure = match (&state.fail_on, &op) {
            (Some(FailOn::ListTags(e)), MockOperation::ListTags { .. })
            | (Some(FailOn::ListClosedIssues(e)), MockOperation::ListClosedIssues { .. })
            | (
                Some(FailOn::ListClosedPullRequests(e)),
                MockOperation::ListClosedPullRequests { .. },
            )
            | (Some(FailOn::GetCommit(e)), MockOperation::GetCommit { .. })
            | (Some(FailOn::GetRepo(e)), MockOperation::GetRepo)
            | (Some(FailOn::ListIssueEvents(e)), MockOperation::ListIssueEvents { .. }) => {
                Some(e.clone())
            }
            _ => None,
        };
        state.operations.push(op);
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

/// Slice out one 1-based page.
fn paginate<T: Clone>(all: &[T], page: u32, page_size: usize) -> Page<T> {
    let start = (page.max(1) as usize - 1) * page_size;
    if start >= all.len() {
        return Page::last(Vec::new());
    }
    let end = (start + page_size).min(all.len());
    Page {
        items: all[start..end].to_vec(),
        next_page: (end < all.len()).then_some(page.max(1) + 1),
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_tags(&self, page: u32) -> Result<Page<Tag>, ForgeError> {
        self.record(MockOperation::ListTags { page })?;
        let state = self.state();
        Ok(paginate(&state.tags, page, state.page_size))
    }

    async fn list_closed_issues(&self, page: u32) -> Result<Page<Item>, ForgeError> {
        self.record(MockOperation::ListClosedIssues { page })?;
        let state = self.state();
        Ok(paginate(&state.items, page, state.page_size))
    }

    async fn list_closed_pull_requests(
        &self,
        page: u32,
        base: Option<&str>,
    ) -> Result<Page<PullRequestSummary>, ForgeError> {
        self.record(MockOperation::ListClosedPullRequests {
            page,
            base: base.map(str::to_string),
        })?;
        let state = self.state();
        let pulls: Vec<PullRequestSummary> = state
            .pulls
            .iter()
            .filter(|(_, pr_base)| base.map_or(true, |b| b == pr_base))
            .map(|(summary, _)| summary.clone())
            .collect();
        Ok(paginate(&pulls, page, state.page_size))
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit, ForgeError> {
        self.record(MockOperation::GetCommit {
            sha: sha.to_string(),
        })?;
        self.state()
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("commit {}", sha)))
    }

    async fn get_repo(&self) -> Result<RepoInfo, ForgeError> {
        self.record(MockOperation::GetRepo)?;
        self.state()
            .repo
            .clone()
            .ok_or_else(|| ForgeError::NotFound("repository".to_string()))
    }

    async fn list_issue_events(&self, number: u64, page: u32) -> Result<Page<Event>, ForgeError> {
        self.record(MockOperation::ListIssueEvents { number, page })?;
        let state = self.state();
        let events = state.events.get(&number).cloned().unwrap_or_default();
        Ok(paginate(&events, page, state.page_size))
    }
}
