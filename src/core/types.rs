//! core::types
//!
//! Typed records for everything the changelog engine reasons about.
//!
//! # Types
//!
//! - [`Tag`] - A release tag, or one of the two synthetic boundaries
//! - [`Item`] - An issue or pull request, uniformly attributed and classified
//! - [`Event`] - One entry of an item's event history
//! - [`Commit`] / [`RepoInfo`] - Raw forge records whose dates are parsed lazily
//!
//! # Validation
//!
//! The forge adapter converts API payloads into these records. Dates that
//! the engine relies on for ordering are parsed into `DateTime<Utc>` at that
//! boundary; dates that may legitimately be malformed (commit dates) stay raw
//! until [`parse_instant`] is applied, so the caller can decide how to degrade.
//!
//! # Example
//!
//! ```
//! use tagscribe::core::types::{parse_instant, Item, Tag};
//!
//! let tag = Tag::release("v1.0.0", "abc123");
//! assert!(!tag.is_synthetic());
//!
//! let closed = parse_instant("2015-03-24T10:00:00+02:00").unwrap();
//! let item = Item::issue(7, "Crash on start").with_closed_at(closed);
//! assert_eq!(item.closed_at, Some(closed));
//! ```

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the synthetic tag that stands for repository creation.
pub const REPO_CREATED_TAG_NAME: &str = "repo_created_at";

/// A timestamp string could not be parsed into an instant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed date '{input}'")]
pub struct MalformedDateError {
    /// The raw input that failed to parse.
    pub input: String,
}

/// Parse an ISO-8601 timestamp into a UTC instant.
///
/// Accepts RFC 3339 (`Z` or `+hh:mm`), compact offsets (`+hhmm`), and a naive
/// `YYYY-MM-DDTHH:MM:SS` form which is read as UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, MalformedDateError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(MalformedDateError {
        input: raw.to_string(),
    })
}

// =============================================================================
// Tags
// =============================================================================

/// Where a tag's instant comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagSource {
    /// A real tag pointing at a commit (by SHA).
    Commit(String),
    /// Synthetic: the repository's creation instant.
    RepoCreation,
    /// Synthetic: the unreleased boundary, resolved to the run start.
    Head,
}

/// A release tag or a synthetic window boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Tag name (also the key of the tag time cache).
    pub name: String,
    /// How the tag's instant is obtained.
    pub source: TagSource,
}

impl Tag {
    /// A real tag pointing at `sha`.
    pub fn release(name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: TagSource::Commit(sha.into()),
        }
    }

    /// The synthetic repository-creation tag.
    pub fn repo_creation() -> Self {
        Self {
            name: REPO_CREATED_TAG_NAME.to_string(),
            source: TagSource::RepoCreation,
        }
    }

    /// The synthetic unreleased tag, named after the unreleased label.
    pub fn head(label: impl Into<String>) -> Self {
        Self {
            name: label.into(),
            source: TagSource::Head,
        }
    }

    /// Whether this tag is one of the synthetic boundaries.
    pub fn is_synthetic(&self) -> bool {
        !matches!(self.source, TagSource::Commit(_))
    }

    /// Commit SHA for real tags.
    pub fn commit_sha(&self) -> Option<&str> {
        match &self.source {
            TagSource::Commit(sha) => Some(sha),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Events
// =============================================================================

/// Kind of an issue event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Closed,
    Merged,
    Reopened,
    /// Any event kind the engine does not interpret.
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Closed => "closed",
            EventKind::Merged => "merged",
            EventKind::Reopened => "reopened",
            EventKind::Other(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            "closed" => EventKind::Closed,
            "merged" => EventKind::Merged,
            "reopened" => EventKind::Reopened,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        EventKind::from(value.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of an item's event history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Commit that caused the event, if any.
    pub commit_id: Option<String>,
    /// Absent when the forge reported a timestamp that does not parse.
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(kind: EventKind, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            commit_id: None,
            created_at: Some(created_at),
        }
    }

    pub fn with_commit(mut self, sha: impl Into<String>) -> Self {
        self.commit_id = Some(sha.into());
        self
    }
}

// =============================================================================
// Items
// =============================================================================

/// Whether an item is an issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Issue => write!(f, "issue"),
            ItemKind::PullRequest => write!(f, "pull request"),
        }
    }
}

/// Author of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub login: String,
    /// Profile URL.
    pub html_url: String,
}

/// An issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub kind: ItemKind,
    pub labels: BTreeSet<String>,
    /// Milestone title, if the item is assigned to one.
    pub milestone: Option<String>,
    pub author: Option<Author>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Merge instant; only pull requests joined with the pulls listing carry it.
    pub merged_at: Option<DateTime<Utc>>,
    /// Event history in occurrence order.
    pub events: Vec<Event>,
    /// Authoritative resolution instant, set by attribution.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Item {
    fn new(kind: ItemKind, number: u64, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            html_url: String::new(),
            kind,
            labels: BTreeSet::new(),
            milestone: None,
            author: None,
            closed_at: None,
            merged_at: None,
            events: Vec::new(),
            resolved_at: None,
        }
    }

    /// A bare issue record.
    pub fn issue(number: u64, title: impl Into<String>) -> Self {
        Self::new(ItemKind::Issue, number, title)
    }

    /// A bare pull request record.
    pub fn pull_request(number: u64, title: impl Into<String>) -> Self {
        Self::new(ItemKind::PullRequest, number, title)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.html_url = url.into();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_milestone(mut self, milestone: impl Into<String>) -> Self {
        self.milestone = Some(milestone.into());
        self
    }

    pub fn with_author(mut self, login: impl Into<String>, html_url: impl Into<String>) -> Self {
        self.author = Some(Author {
            login: login.into(),
            html_url: html_url.into(),
        });
        self
    }

    pub fn with_closed_at(mut self, at: DateTime<Utc>) -> Self {
        self.closed_at = Some(at);
        self
    }

    pub fn with_merged_at(mut self, at: DateTime<Utc>) -> Self {
        self.merged_at = Some(at);
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn with_resolved_at(mut self, at: DateTime<Utc>) -> Self {
        self.resolved_at = Some(at);
        self
    }

    pub fn is_pull_request(&self) -> bool {
        self.kind == ItemKind::PullRequest
    }

    /// The event kind that marks this item as resolved.
    ///
    /// Items carrying `merged_at` resolve on `merged`, everything else on
    /// `closed`.
    pub fn terminal_event_kind(&self) -> EventKind {
        if self.merged_at.is_some() {
            EventKind::Merged
        } else {
            EventKind::Closed
        }
    }

    /// Whether any of this item's labels appears in `labels`.
    pub fn has_any_label<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels.iter().any(|l| self.labels.contains(l.as_ref()))
    }
}

// =============================================================================
// Raw forge records
// =============================================================================

/// A commit as returned by the forge, dates unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub author_date: Option<String>,
    pub committer_date: Option<String>,
}

/// Repository metadata needed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// Raw `created_at` timestamp.
    pub created_at: String,
}
