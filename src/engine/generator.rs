//! engine::generator
//!
//! Orchestrates one changelog generation run.
//!
//! # Flow
//!
//! ```text
//! tags -> tag filter -> items -> item filters -> events -> attribution
//!      -> windows -> partition (+ milestone override) -> sections -> markdown
//! ```
//!
//! The run owns a fresh [`RunContext`]; nothing survives between runs.
//!
//! # Example
//!
//! ```ignore
//! use tagscribe::engine::{generate, GeneratorOptions};
//!
//! let changelog = generate(&forge, &GeneratorOptions::default()).await?;
//! if !changelog.is_empty() {
//!     std::fs::write("CHANGELOG.md", &changelog.text)?;
//! }
//! ```

use super::attribution::attribute_all;
use super::context::RunContext;
use super::error::GeneratorError;
use super::fetch::{fetch_closed_items, fetch_closed_pulls, fetch_events, fetch_tags};
use super::item_filter::{filter_items, join_merged};
use super::options::GeneratorOptions;
use super::resolver::TemporalResolver;
use super::sections::{classify, Bucket};
use super::tag_filter::filter_tags;
use super::window::{apply_milestone_override, partition, plan_windows, PlanOptions, WindowSpec};
use crate::core::types::Item;
use crate::forge::Forge;
use crate::ui::markdown::{self, WindowContent, WindowHeader};

/// Link used for the unreleased window when no future release is named.
const HEAD_LINK: &str = "HEAD";

/// A rendered changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    /// The markdown document.
    pub text: String,
    /// Windows that rendered at least one item.
    pub windows: usize,
    /// Items rendered across all windows.
    pub items: usize,
    /// Whether base changelog text was appended.
    pub has_base: bool,
}

impl Changelog {
    /// True when there is nothing worth writing.
    pub fn is_empty(&self) -> bool {
        self.windows == 0 && !self.has_base
    }
}

/// Run a complete generation against `forge`.
pub async fn generate(
    forge: &dyn Forge,
    options: &GeneratorOptions,
) -> Result<Changelog, GeneratorError> {
    let ctx = RunContext::new(options.max_concurrent_requests);
    generate_with_context(forge, options, &ctx).await
}

/// Run a complete generation with a caller-provided context.
pub async fn generate_with_context(
    forge: &dyn Forge,
    options: &GeneratorOptions,
    ctx: &RunContext,
) -> Result<Changelog, GeneratorError> {
    let resolver = TemporalResolver::new(forge, ctx);

    let tags = fetch_tags(forge).await?;
    if tags.is_empty() {
        tracing::warn!("repository has no tags; the changelog will be empty");
    }
    let tag_filter = options.effective_tag_filter();
    let (all_timed, filtered) = filter_tags(&resolver, &tags, &tag_filter).await?;

    let items = fetch_closed_items(forge, options.max_issues).await?;
    let mut items = filter_items(items, &options.items);
    if items.iter().any(Item::is_pull_request) {
        let pulls = fetch_closed_pulls(forge, options.release_branch.as_deref()).await?;
        items = join_merged(items, &pulls);
    }
    let items = fetch_events(forge, ctx, items).await?;
    let corpus = attribute_all(forge, ctx, items).await?;

    let windows = plan_windows(
        &filtered,
        &all_timed,
        &PlanOptions {
            include_unreleased: options.include_unreleased,
            unreleased_only: options.unreleased_only,
            unreleased_label: options.unreleased_window_label().to_string(),
            infer_lower_bound: tag_filter.narrows_history(),
        },
    );
    let known_labels: Vec<String> = windows.iter().map(|w| w.label.clone()).collect();
    tracing::debug!(windows = windows.len(), items = corpus.len(), "planned windows");

    let mut rendered = Vec::with_capacity(windows.len());
    let mut window_count = 0;
    let mut item_count = 0;

    for spec in &windows {
        let older_at = resolver.resolve(spec.older.as_ref()).await?;
        let newer_at = resolver.resolve(spec.newer.as_ref()).await?;

        let mut selected = partition(&corpus, Some(older_at), Some(newer_at))?;
        if options.filter_by_milestone {
            selected = apply_milestone_override(selected, &corpus, &spec.label, &known_labels);
        }

        let content = window_content(selected, options);
        if content.is_empty() {
            tracing::debug!(window = %spec.label, "no items; window skipped");
            continue;
        }
        item_count += count_items(&content);
        window_count += 1;

        let link = window_link(spec, options);
        let older_link = spec.older.as_ref().map_or("", |t| t.name.as_str());
        let header = WindowHeader {
            name: &spec.label,
            link,
            date: newer_at,
            older_link,
            unreleased: spec.unreleased,
        };
        rendered.push(markdown::window(&header, &content, &options.render));
    }

    let base = options.base.as_ref().map(|b| b.raw.as_str());
    let text = markdown::document(&rendered, base, &options.render);
    tracing::info!(
        windows = window_count,
        items = item_count,
        events = ctx.events_fetched(),
        "generated changelog"
    );

    Ok(Changelog {
        text,
        windows: window_count,
        items: item_count,
        has_base: base.is_some_and(|b| !b.trim().is_empty()),
    })
}

/// Link ref of a window.
fn window_link<'a>(spec: &'a WindowSpec, options: &'a GeneratorOptions) -> &'a str {
    if !spec.unreleased {
        spec.label.as_str()
    } else if let Some(future) = options.future_release.as_deref() {
        future
    } else {
        HEAD_LINK
    }
}

/// Classify issues and pull requests separately, then merge the named
/// sections issues first.
fn window_content(items: Vec<Item>, options: &GeneratorOptions) -> WindowContent {
    let (pulls, issues): (Vec<Item>, Vec<Item>) =
        items.into_iter().partition(Item::is_pull_request);

    let issues = classify(issues, &options.sections);
    let pulls = classify(pulls, &options.sections);

    let buckets = issues
        .buckets
        .into_iter()
        .zip(pulls.buckets)
        .map(|(mut bucket, pull_bucket): (Bucket, Bucket)| {
            bucket.items.extend(pull_bucket.items);
            bucket
        })
        .collect();

    WindowContent {
        buckets,
        leftover_issues: issues.leftover,
        leftover_pulls: pulls.leftover,
    }
}

fn count_items(content: &WindowContent) -> usize {
    content.buckets.iter().map(|b| b.items.len()).sum::<usize>()
        + content.leftover_issues.len()
        + content.leftover_pulls.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Event, EventKind};
    use crate::forge::mock::MockForge;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()
    }

    fn closed_issue(number: u64, d: u32, labels: &[&str]) -> Item {
        Item::issue(number, format!("Issue {}", number))
            .with_url(format!("https://github.com/o/r/issues/{}", number))
            .with_labels(labels.iter().copied())
            .with_closed_at(day(d))
            .with_events(vec![Event::new(EventKind::Closed, day(d))])
    }

    fn forge() -> MockForge {
        MockForge::new()
            .with_repo_created_at("2019-12-01T00:00:00Z")
            .with_tag("v2", "b", "2020-01-20T00:00:00Z")
            .with_tag("v1", "a", "2020-01-10T00:00:00Z")
    }

    fn options() -> GeneratorOptions {
        let mut options = GeneratorOptions::default();
        options.render.project_url = "https://github.com/o/r".into();
        options
    }

    #[tokio::test]
    async fn items_land_in_their_windows() {
        let forge = forge()
            .with_item(closed_issue(1, 5, &["bug"]))
            .with_item(closed_issue(2, 15, &[]))
            .with_item(closed_issue(3, 25, &["enhancement"]));

        let ctx = RunContext::started_at(day(30), 4);
        let changelog = generate_with_context(&forge, &options(), &ctx)
            .await
            .unwrap();

        assert_eq!(changelog.windows, 3);
        assert_eq!(changelog.items, 3);
        let text = &changelog.text;
        let unreleased = text.find("## [Unreleased]").unwrap();
        let v2 = text.find("## [v2]").unwrap();
        let v1 = text.find("## [v1]").unwrap();
        let i1 = text.find("Issue 1").unwrap();
        let i2 = text.find("Issue 2").unwrap();
        let i3 = text.find("Issue 3").unwrap();
        assert!(unreleased < i3 && i3 < v2);
        assert!(v2 < i2 && i2 < v1);
        assert!(v1 < i1);
        assert!(text.starts_with("# Change Log\n\n"));
    }

    #[tokio::test]
    async fn empty_windows_skipped() {
        let forge = forge().with_item(closed_issue(1, 15, &[]));
        let ctx = RunContext::started_at(day(30), 4);
        let changelog = generate_with_context(&forge, &options(), &ctx)
            .await
            .unwrap();
        assert_eq!(changelog.windows, 1);
        assert!(!changelog.text.contains("Unreleased"));
        assert!(!changelog.is_empty());
    }

    #[tokio::test]
    async fn no_tags_is_empty() {
        let forge = MockForge::new()
            .with_repo_created_at("2019-12-01T00:00:00Z")
            .with_item(closed_issue(1, 15, &[]));
        let changelog = generate(&forge, &options()).await.unwrap();
        assert!(changelog.is_empty());
        assert_eq!(changelog.text, "# Change Log\n\n");
    }

    #[tokio::test]
    async fn future_release_names_unreleased_window() {
        let forge = forge().with_item(closed_issue(1, 25, &[]));
        let mut options = options();
        options.future_release = Some("v3".into());
        let ctx = RunContext::started_at(day(30), 4);
        let changelog = generate_with_context(&forge, &options, &ctx)
            .await
            .unwrap();
        assert!(changelog
            .text
            .contains("## [v3](https://github.com/o/r/tree/v3)\n"));
        assert!(changelog.text.contains("compare/v2...v3"));
    }

    #[tokio::test]
    async fn section_buckets_merge_issues_then_pulls() {
        let pr = Item::pull_request(9, "Fix via PR")
            .with_url("https://github.com/o/r/pull/9")
            .with_labels(["bug"])
            .with_author("bob", "https://github.com/bob")
            .with_closed_at(day(15))
            .with_merged_at(day(15))
            .with_events(vec![Event::new(EventKind::Merged, day(15))]);
        let forge = forge()
            .with_item(pr)
            .with_item(closed_issue(4, 14, &["bug"]));

        let ctx = RunContext::started_at(day(30), 4);
        let changelog = generate_with_context(&forge, &options(), &ctx)
            .await
            .unwrap();
        let text = &changelog.text;
        let bugs = text.find("**Fixed bugs:**").unwrap();
        let issue = text.find("Issue 4").unwrap();
        let pull = text.find("Fix via PR").unwrap();
        assert!(bugs < issue && issue < pull);
        assert!(!text.contains("**Merged pull requests:**"));
    }

    #[test]
    fn window_link_choices() {
        let spec = WindowSpec {
            label: "Unreleased".into(),
            older: None,
            newer: None,
            unreleased: true,
        };
        let mut options = GeneratorOptions::default();
        assert_eq!(window_link(&spec, &options), "HEAD");
        options.future_release = Some("v9".into());
        assert_eq!(window_link(&spec, &options), "v9");

        let released = WindowSpec {
            unreleased: false,
            label: "v1".into(),
            ..spec
        };
        assert_eq!(window_link(&released, &options), "v1");
    }
}
