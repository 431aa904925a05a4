//! engine::resolver
//!
//! Temporal resolution of tags into instants.
//!
//! # Design
//!
//! Every tag, real or synthetic, maps to one instant per run:
//!
//! - a real tag resolves to its commit's committer date (author date when the
//!   committer date is missing);
//! - the repository-creation tag resolves to the repository's `created_at`;
//! - the unreleased tag resolves to the run-start instant.
//!
//! Resolved instants are memoized in the run's [`TagTimeCache`], so asking
//! twice for the same tag name never reaches the forge twice. Batch
//! resolution fans out over distinct uncached tags with a bounded number of
//! requests in flight and writes results back from a single task.
//!
//! # Example
//!
//! ```ignore
//! let ctx = RunContext::new(25);
//! let resolver = TemporalResolver::new(&forge, &ctx);
//! let sorted = resolver.sort_desc(&tags).await?;
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};

use super::context::RunContext;
use super::error::GeneratorError;
use crate::core::types::{parse_instant, MalformedDateError, Tag, TagSource};
use crate::forge::Forge;

/// Write-once map from tag name to instant.
#[derive(Debug, Default, Clone)]
pub struct TagTimeCache {
    times: HashMap<String, DateTime<Utc>>,
}

impl TagTimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<DateTime<Utc>> {
        self.times.get(name).copied()
    }

    /// Insert unless the name is already cached. Returns whether it was inserted.
    pub fn insert(&mut self, name: &str, at: DateTime<Utc>) -> bool {
        if self.times.contains_key(name) {
            return false;
        }
        self.times.insert(name.to_string(), at);
        true
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// A tag paired with its resolved instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedTag {
    pub tag: Tag,
    pub at: DateTime<Utc>,
}

impl TimedTag {
    pub fn name(&self) -> &str {
        &self.tag.name
    }
}

/// Resolves tags to instants through the forge, memoizing per run.
pub struct TemporalResolver<'a> {
    forge: &'a dyn Forge,
    ctx: &'a RunContext,
}

impl<'a> TemporalResolver<'a> {
    pub fn new(forge: &'a dyn Forge, ctx: &'a RunContext) -> Self {
        Self { forge, ctx }
    }

    /// Resolve one tag.
    ///
    /// # Errors
    ///
    /// - `MissingTag` if `tag` is `None`
    /// - `MalformedDate` if the forge's date does not parse
    /// - forge errors, with rate limiting distinguished
    pub async fn resolve(&self, tag: Option<&Tag>) -> Result<DateTime<Utc>, GeneratorError> {
        let tag = tag.ok_or(GeneratorError::MissingTag)?;
        if let Some(at) = self.ctx.cached_time(&tag.name) {
            return Ok(at);
        }
        let at = self.fetch_time(tag).await?;
        Ok(self.ctx.store_time(&tag.name, at))
    }

    /// Resolve every distinct uncached tag, at most
    /// `max_concurrent_requests` at a time.
    pub async fn resolve_all(&self, tags: &[Tag]) -> Result<(), GeneratorError> {
        let mut seen = HashSet::new();
        let pending: Vec<&Tag> = tags
            .iter()
            .filter(|t| self.ctx.cached_time(&t.name).is_none())
            .filter(|t| seen.insert(t.name.as_str()))
            .collect();

        if pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = pending.len(), "resolving tag dates");

        let resolved: Vec<(&str, DateTime<Utc>)> = stream::iter(pending)
            .map(|tag| async move {
                let at = self.fetch_time(tag).await?;
                Ok::<_, GeneratorError>((tag.name.as_str(), at))
            })
            .buffer_unordered(self.ctx.max_concurrent_requests())
            .try_collect()
            .await?;

        for (name, at) in resolved {
            self.ctx.store_time(name, at);
        }
        Ok(())
    }

    /// Pair each tag with its instant, preserving input order.
    pub async fn timed(&self, tags: &[Tag]) -> Result<Vec<TimedTag>, GeneratorError> {
        self.resolve_all(tags).await?;
        tags.iter()
            .map(|tag| {
                let at = self
                    .ctx
                    .cached_time(&tag.name)
                    .ok_or(GeneratorError::MissingTag)?;
                Ok(TimedTag {
                    tag: tag.clone(),
                    at,
                })
            })
            .collect()
    }

    /// Resolve and stable-sort tags newest first.
    pub async fn sort_desc(&self, tags: &[Tag]) -> Result<Vec<TimedTag>, GeneratorError> {
        let mut timed = self.timed(tags).await?;
        sort_timed_desc(&mut timed);
        Ok(timed)
    }

    async fn fetch_time(&self, tag: &Tag) -> Result<DateTime<Utc>, GeneratorError> {
        let raw = match &tag.source {
            TagSource::Head => return Ok(self.ctx.start()),
            TagSource::RepoCreation => self.forge.get_repo().await?.created_at,
            TagSource::Commit(sha) => {
                let commit = self.forge.get_commit(sha).await?;
                commit
                    .committer_date
                    .or(commit.author_date)
                    .unwrap_or_default()
            }
        };
        parse_instant(&raw).map_err(|source| malformed(tag, source))
    }
}

fn malformed(tag: &Tag, source: MalformedDateError) -> GeneratorError {
    GeneratorError::MalformedDate {
        tag: tag.name.clone(),
        source,
    }
}

/// Stable sort, newest first; equal instants keep their relative order.
pub fn sort_timed_desc(tags: &mut [TimedTag]) {
    tags.sort_by(|a, b| b.at.cmp(&a.at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge};
    use crate::forge::ForgeError;
    use chrono::TimeZone;

    fn forge() -> MockForge {
        MockForge::new()
            .with_repo_created_at("2015-01-01T00:00:00Z")
            .with_tag("v1", "a", "2015-02-01T00:00:00Z")
            .with_tag("v2", "b", "2015-03-01T00:00:00Z")
            .with_tag("v2-alias", "b", "2015-03-01T00:00:00Z")
    }

    #[tokio::test]
    async fn resolve_none_is_missing_tag() {
        let forge = forge();
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        assert!(matches!(
            resolver.resolve(None).await,
            Err(GeneratorError::MissingTag)
        ));
    }

    #[tokio::test]
    async fn resolve_is_memoized() {
        let forge = forge();
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        let tag = Tag::release("v1", "a");

        let first = resolver.resolve(Some(&tag)).await.unwrap();
        let second = resolver.resolve(Some(&tag)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Utc.with_ymd_and_hms(2015, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(forge.commit_lookups("a"), 1);
    }

    #[tokio::test]
    async fn synthetic_tags() {
        let forge = forge();
        let start = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        let ctx = RunContext::started_at(start, 4);
        let resolver = TemporalResolver::new(&forge, &ctx);

        let head = resolver.resolve(Some(&Tag::head("Unreleased"))).await.unwrap();
        assert_eq!(head, start);

        let created = resolver
            .resolve(Some(&Tag::repo_creation()))
            .await
            .unwrap();
        assert_eq!(created, Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn author_date_fallback() {
        let forge = MockForge::new().with_commit("c", Some("2016-01-01T00:00:00Z"), None);
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        let at = resolver
            .resolve(Some(&Tag::release("v3", "c")))
            .await
            .unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn malformed_tag_date_is_fatal() {
        let forge = MockForge::new().with_tag("bad", "x", "not a date");
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        let err = resolver
            .resolve(Some(&Tag::release("bad", "x")))
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedDate { ref tag, .. } if tag == "bad"));
    }

    #[tokio::test]
    async fn resolve_all_deduplicates_names() {
        let forge = forge();
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        let tags = vec![
            Tag::release("v1", "a"),
            Tag::release("v1", "a"),
            Tag::release("v2", "b"),
        ];
        resolver.resolve_all(&tags).await.unwrap();
        resolver.resolve_all(&tags).await.unwrap();
        assert_eq!(forge.commit_lookups("a"), 1);
        assert_eq!(forge.commit_lookups("b"), 1);
        assert_eq!(ctx.cached_tags(), 2);
    }

    #[tokio::test]
    async fn sort_desc_is_stable() {
        let forge = forge();
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        let tags = vec![
            Tag::release("v1", "a"),
            Tag::release("v2", "b"),
            Tag::release("v2-alias", "b"),
        ];
        let sorted = resolver.sort_desc(&tags).await.unwrap();
        let names: Vec<&str> = sorted.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["v2", "v2-alias", "v1"]);
    }

    #[tokio::test]
    async fn rate_limit_surfaces() {
        let forge = forge().fail_on(FailOn::GetCommit(ForgeError::RateLimited));
        let ctx = RunContext::new(4);
        let resolver = TemporalResolver::new(&forge, &ctx);
        let err = resolver
            .resolve_all(&[Tag::release("v1", "a")])
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::RateLimitExceeded));
    }

    #[test]
    fn cache_insert_once() {
        let mut cache = TagTimeCache::new();
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(cache.is_empty());
        assert!(cache.insert("v1", at));
        assert!(!cache.insert("v1", at));
        assert_eq!(cache.len(), 1);
    }
}
