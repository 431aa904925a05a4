//! engine::fetch
//!
//! Retrieval of tags, items, and event histories from the forge.
//!
//! # Concurrency
//!
//! Pages of a single listing are fetched strictly in sequence, following
//! each page's `next_page`. Event histories of distinct items are fetched
//! concurrently, at most `max_concurrent_requests` at a time; each future
//! owns exactly one item.

use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};

use super::context::RunContext;
use crate::core::types::{Item, Tag};
use crate::forge::{Forge, ForgeError, Page, PullRequestSummary};

/// Walk a paginated listing from page 1, stopping early once `limit`
/// records are collected or the next page does not advance.
pub async fn collect_pages<T, F, Fut>(mut fetch: F, limit: Option<usize>) -> Result<Vec<T>, ForgeError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, ForgeError>>,
{
    let mut all = Vec::new();
    let mut next = Some(1);

    while let Some(page) = next {
        let result = fetch(page).await?;
        all.extend(result.items);
        next = result.next_page.filter(|&n| {
            if n <= page {
                tracing::warn!(page, next = n, "pagination does not advance; stopping");
            }
            n > page
        });

        if let Some(limit) = limit {
            if all.len() >= limit {
                all.truncate(limit);
                break;
            }
        }
    }
    Ok(all)
}

/// Fetch every tag.
pub async fn fetch_tags(forge: &dyn Forge) -> Result<Vec<Tag>, ForgeError> {
    let tags = collect_pages(|page| forge.list_tags(page), None).await?;
    tracing::info!(count = tags.len(), "found tags");
    Ok(tags)
}

/// Fetch closed issues and pull requests, up to `max_items`.
pub async fn fetch_closed_items(
    forge: &dyn Forge,
    max_items: Option<usize>,
) -> Result<Vec<Item>, ForgeError> {
    let items = collect_pages(|page| forge.list_closed_issues(page), max_items).await?;
    if max_items.is_some_and(|max| items.len() >= max) {
        tracing::warn!(
            count = items.len(),
            "stopped fetching closed items at the --max-issues limit"
        );
    }
    tracing::info!(count = items.len(), "fetched closed issues and pull requests");
    Ok(items)
}

/// Fetch closed pull requests, optionally limited to a base branch.
pub async fn fetch_closed_pulls(
    forge: &dyn Forge,
    base: Option<&str>,
) -> Result<Vec<PullRequestSummary>, ForgeError> {
    let pulls = collect_pages(|page| forge.list_closed_pull_requests(page, base), None).await?;
    tracing::info!(count = pulls.len(), "fetched closed pull requests");
    Ok(pulls)
}

/// Fetch the full event history of every item, preserving item order.
pub async fn fetch_events(
    forge: &dyn Forge,
    ctx: &RunContext,
    items: Vec<Item>,
) -> Result<Vec<Item>, ForgeError> {
    let items: Vec<Item> = stream::iter(items)
        .map(|item| async move {
            let number = item.number;
            let events = collect_pages(|page| forge.list_issue_events(number, page), None).await?;
            ctx.add_events(events.len());
            Ok::<_, ForgeError>(item.with_events(events))
        })
        .buffered(ctx.max_concurrent_requests())
        .try_collect()
        .await?;

    tracing::info!(
        items = items.len(),
        events = ctx.events_fetched(),
        "fetched events"
    );
    Ok(items)
}
