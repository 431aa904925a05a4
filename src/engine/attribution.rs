//! engine::attribution
//!
//! Determines the instant at which an item was actually resolved.
//!
//! # Algorithm
//!
//! An item's `closed_at` is not trustworthy: it moves when an issue is
//! reopened, and a fix may land in a commit long before the issue is closed
//! by hand. Instead the item's event history is consulted:
//!
//! 1. Items carrying `merged_at` resolve on their last `merged` event,
//!    everything else on its last `closed` event.
//! 2. If that event references a commit, the commit's author date wins.
//!    A commit the forge cannot find (typically one from a fork) or whose
//!    date does not parse degrades to `closed_at`.
//! 3. Without a commit reference, `closed_at` is used.
//!
//! Items with no events or no matching event are left unattributed and are
//! dropped from the changelog with a warning.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};

use super::context::RunContext;
use super::error::GeneratorError;
use crate::core::types::{parse_instant, Item};
use crate::forge::{Forge, ForgeError};

/// Compute the authoritative resolution instant of one item.
///
/// Returns `Ok(None)` when the item cannot be attributed.
///
/// # Errors
///
/// Forge failures other than a missing commit abort the run.
pub async fn attribute(
    forge: &dyn Forge,
    item: &Item,
) -> Result<Option<DateTime<Utc>>, GeneratorError> {
    if item.events.is_empty() {
        tracing::warn!(number = item.number, "no events for #{}; skipped", item.number);
        return Ok(None);
    }

    let wanted = item.terminal_event_kind();
    let Some(event) = item.events.iter().rfind(|e| e.kind == wanted) else {
        tracing::warn!(
            number = item.number,
            kind = %wanted,
            "no '{}' event for #{}; skipped",
            wanted,
            item.number
        );
        return Ok(None);
    };

    let Some(sha) = event.commit_id.as_deref() else {
        return Ok(closed_at_fallback(item));
    };

    match forge.get_commit(sha).await {
        Ok(commit) => match commit.author_date.as_deref().map(parse_instant) {
            Some(Ok(at)) => Ok(Some(at)),
            Some(Err(e)) => {
                tracing::warn!(number = item.number, sha, "{}; using closed_at", e);
                Ok(closed_at_fallback(item))
            }
            None => {
                tracing::warn!(number = item.number, sha, "commit has no author date; using closed_at");
                Ok(closed_at_fallback(item))
            }
        },
        Err(ForgeError::NotFound(_)) => {
            tracing::warn!(
                number = item.number,
                sha,
                "can't fetch commit {}; it is probably referenced from another repository",
                sha
            );
            Ok(closed_at_fallback(item))
        }
        Err(e) => Err(e.into()),
    }
}

/// The item's `closed_at`, warning when there is none to fall back to.
fn closed_at_fallback(item: &Item) -> Option<DateTime<Utc>> {
    if item.closed_at.is_none() {
        tracing::warn!(number = item.number, "no closed_at for #{}; skipped", item.number);
    }
    item.closed_at
}

/// Attribute every item, keeping only those that resolve.
///
/// At most `max_concurrent_requests` commit lookups are in flight; the
/// output preserves input order.
pub async fn attribute_all(
    forge: &dyn Forge,
    ctx: &RunContext,
    items: Vec<Item>,
) -> Result<Vec<Item>, GeneratorError> {
    let total = items.len();
    let attributed: Vec<Option<Item>> = stream::iter(items)
        .map(|item| async move {
            let resolved = attribute(forge, &item).await?;
            Ok::<_, GeneratorError>(resolved.map(|at| item.with_resolved_at(at)))
        })
        .buffered(ctx.max_concurrent_requests())
        .try_collect()
        .await?;

    let kept: Vec<Item> = attributed.into_iter().flatten().collect();
    tracing::debug!(total, kept = kept.len(), "attributed items");
    Ok(kept)
}
