//! engine::window
//!
//! Partitioning of attributed items into release windows.
//!
//! # Windows
//!
//! A window is the half-open interval `(older, newer]` between two adjacent
//! tags. Windows over the filtered tag list are contiguous and never
//! overlap, so an item resolved exactly at a tag's instant belongs to the
//! window that tag closes.
//!
//! # Milestone override
//!
//! An item whose milestone names a release belongs to that release no
//! matter when it was resolved. The override runs in two passes over a
//! window's selection: items claimed by another window's milestone are
//! removed, then items claimed by this window's milestone are added from the
//! whole attributed corpus.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::error::GeneratorError;
use super::resolver::TimedTag;
use crate::core::types::{Item, Tag};

/// Select items with `older < resolved_at <= newer`.
///
/// Both bounds absent selects everything; exactly one absent is an error.
pub fn partition(
    items: &[Item],
    older: Option<DateTime<Utc>>,
    newer: Option<DateTime<Utc>>,
) -> Result<Vec<Item>, GeneratorError> {
    match (older, newer) {
        (None, None) => Ok(items.to_vec()),
        (Some(older), Some(newer)) => Ok(items
            .iter()
            .filter(|item| {
                item.resolved_at
                    .is_some_and(|at| older < at && at <= newer)
            })
            .cloned()
            .collect()),
        _ => Err(GeneratorError::MissingTag),
    }
}

/// Apply the milestone override to one window's selection.
///
/// `known_labels` are the labels of every planned window.
pub fn apply_milestone_override(
    selected: Vec<Item>,
    corpus: &[Item],
    window_label: &str,
    known_labels: &[String],
) -> Vec<Item> {
    let claimed_elsewhere = |item: &Item| {
        item.milestone.as_deref().is_some_and(|m| {
            m != window_label && known_labels.iter().any(|label| label == m)
        })
    };

    let mut kept: Vec<Item> = selected
        .into_iter()
        .filter(|item| !claimed_elsewhere(item))
        .collect();

    let present: HashSet<u64> = kept.iter().map(|i| i.number).collect();
    let additions: Vec<Item> = corpus
        .iter()
        .filter(|item| item.milestone.as_deref() == Some(window_label))
        .filter(|item| !present.contains(&item.number))
        .cloned()
        .collect();

    kept.extend(additions);
    kept
}

/// One planned changelog window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    /// Release label (the newer tag's name, or the unreleased label).
    pub label: String,
    /// Exclusive lower bound.
    pub older: Option<Tag>,
    /// Inclusive upper bound.
    pub newer: Option<Tag>,
    /// Whether this is the unreleased window.
    pub unreleased: bool,
}

/// Window planning options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Plan a leading window from the newest tag to HEAD.
    pub include_unreleased: bool,
    /// Plan only the unreleased window.
    pub unreleased_only: bool,
    /// Label of the unreleased window.
    pub unreleased_label: String,
    /// Bound the oldest window by the newest older tag in the full list
    /// rather than repository creation.
    pub infer_lower_bound: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            include_unreleased: true,
            unreleased_only: false,
            unreleased_label: "Unreleased".to_string(),
            infer_lower_bound: false,
        }
    }
}

/// Plan the windows for a filtered, newest-first tag list.
///
/// `all` is every tag of the repository with its instant.
pub fn plan_windows(filtered: &[TimedTag], all: &[TimedTag], options: &PlanOptions) -> Vec<WindowSpec> {
    let Some(newest) = filtered.first() else {
        return Vec::new();
    };

    let mut windows = Vec::with_capacity(filtered.len() + 1);

    if options.include_unreleased || options.unreleased_only {
        windows.push(WindowSpec {
            label: options.unreleased_label.clone(),
            older: Some(newest.tag.clone()),
            newer: Some(Tag::head(options.unreleased_label.clone())),
            unreleased: true,
        });
    }
    if options.unreleased_only {
        return windows;
    }

    for pair in filtered.windows(2) {
        windows.push(WindowSpec {
            label: pair[0].name().to_string(),
            older: Some(pair[1].tag.clone()),
            newer: Some(pair[0].tag.clone()),
            unreleased: false,
        });
    }

    if let Some(oldest) = filtered.last() {
        windows.push(WindowSpec {
            label: oldest.name().to_string(),
            older: Some(lower_bound(oldest, all, options.infer_lower_bound)),
            newer: Some(oldest.tag.clone()),
            unreleased: false,
        });
    }

    windows
}

/// Lower bound of the oldest window.
fn lower_bound(oldest: &TimedTag, all: &[TimedTag], infer: bool) -> Tag {
    if infer {
        let older = all
            .iter()
            .filter(|t| !t.tag.is_synthetic() && t.at < oldest.at)
            .fold(None::<&TimedTag>, |best, t| match best {
                Some(b) if b.at >= t.at => Some(b),
                _ => Some(t),
            });
        if let Some(tag) = older {
            return tag.tag.clone();
        }
    }
    Tag::repo_creation()
}
