//! engine::item_filter
//!
//! Filters applied to fetched items before their event histories are
//! requested, plus the join that gives pull requests their merge instant.

use std::collections::HashMap;

use crate::core::types::{parse_instant, Item};
use crate::forge::PullRequestSummary;

/// Labels excluded by default.
pub fn default_exclude_labels() -> Vec<String> {
    ["duplicate", "question", "invalid", "wontfix"]
        .iter()
        .flat_map(|l| {
            let mut capitalized = l.to_string();
            if let Some(first) = capitalized.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            [l.to_string(), capitalized]
        })
        .collect()
}

/// Item filter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilterOptions {
    pub include_issues: bool,
    pub include_pull_requests: bool,
    /// When non-empty, labeled items must carry one of these.
    pub include_labels: Vec<String>,
    /// Items carrying any of these are dropped.
    pub exclude_labels: Vec<String>,
    /// Keep issues without labels.
    pub add_issues_wo_labels: bool,
    /// Keep pull requests without labels.
    pub add_pr_wo_labels: bool,
}

impl Default for ItemFilterOptions {
    fn default() -> Self {
        Self {
            include_issues: true,
            include_pull_requests: true,
            include_labels: Vec::new(),
            exclude_labels: default_exclude_labels(),
            add_issues_wo_labels: true,
            add_pr_wo_labels: true,
        }
    }
}

/// Keep the items the options admit, in input order.
pub fn filter_items(items: Vec<Item>, options: &ItemFilterOptions) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| {
            if item.is_pull_request() {
                options.include_pull_requests
            } else {
                options.include_issues
            }
        })
        .filter(|item| {
            if item.labels.is_empty() {
                if item.is_pull_request() {
                    options.add_pr_wo_labels
                } else {
                    options.add_issues_wo_labels
                }
            } else {
                options.include_labels.is_empty() || item.has_any_label(&options.include_labels)
            }
        })
        .filter(|item| !item.has_any_label(&options.exclude_labels))
        .collect()
}

/// Give pull requests their merge instant and drop those never merged.
///
/// Issues pass through untouched. A pull request missing from `pulls` (for
/// instance one targeting another base branch) is dropped.
pub fn join_merged(items: Vec<Item>, pulls: &[PullRequestSummary]) -> Vec<Item> {
    let merged: HashMap<u64, Option<&str>> = pulls
        .iter()
        .map(|p| (p.number, p.merged_at.as_deref()))
        .collect();

    items
        .into_iter()
        .filter_map(|mut item| {
            if !item.is_pull_request() {
                return Some(item);
            }
            let raw = merged.get(&item.number).copied().flatten()?;
            match parse_instant(raw) {
                Ok(at) => {
                    item.merged_at = Some(at);
                    Some(item)
                }
                Err(e) => {
                    tracing::warn!(number = item.number, "{}; pull request skipped", e);
                    None
                }
            }
        })
        .collect()
}
