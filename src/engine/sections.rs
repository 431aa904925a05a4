//! engine::sections
//!
//! Label-driven classification of a window's items into sections.
//!
//! Sections are tried in declared order and the first one whose labels
//! intersect an item's labels claims it. Every item lands in exactly one
//! bucket: a named section or the leftover bucket.

use serde::{Deserialize, Serialize};

use crate::core::types::Item;

/// Heading prefix of the bug section.
pub const BUG_PREFIX: &str = "**Fixed bugs:**";
/// Heading prefix of the enhancement section.
pub const ENHANCEMENT_PREFIX: &str = "**Implemented enhancements:**";
/// Heading prefix for leftover issues.
pub const ISSUE_PREFIX: &str = "**Closed issues:**";
/// Heading prefix for leftover pull requests.
pub const MERGE_PREFIX: &str = "**Merged pull requests:**";

/// A user-defined changelog section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    /// Heading rendered above the section's items.
    pub title: String,
    /// Labels that route an item into this section.
    pub labels: Vec<String>,
}

impl Section {
    pub fn new<I, S>(title: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

/// The built-in sections: enhancements, then bugs.
pub fn default_sections() -> Vec<Section> {
    vec![
        Section::new(ENHANCEMENT_PREFIX, ["enhancement", "Enhancement"]),
        Section::new(BUG_PREFIX, ["bug", "Bug"]),
    ]
}

/// Items claimed by one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub title: String,
    pub items: Vec<Item>,
}

/// Result of classifying a set of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// One bucket per section, in declared order (possibly empty).
    pub buckets: Vec<Bucket>,
    /// Items no section claimed.
    pub leftover: Vec<Item>,
}

/// Classify items into sections, first match wins.
pub fn classify(items: Vec<Item>, sections: &[Section]) -> Classified {
    let mut buckets: Vec<Bucket> = sections
        .iter()
        .map(|s| Bucket {
            title: s.title.clone(),
            items: Vec::new(),
        })
        .collect();
    let mut leftover = Vec::new();

    for item in items {
        match sections.iter().position(|s| item.has_any_label(&s.labels)) {
            Some(index) => buckets[index].items.push(item),
            None => leftover.push(item),
        }
    }

    Classified { buckets, leftover }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(items: &[Item]) -> Vec<u64> {
        items.iter().map(|i| i.number).collect()
    }

    #[test]
    fn first_matching_section_wins() {
        let items = vec![
            Item::issue(1, "both").with_labels(["bug", "enhancement"]),
            Item::issue(2, "bug").with_labels(["Bug"]),
            Item::issue(3, "other").with_labels(["docs"]),
            Item::issue(4, "none"),
        ];
        let classified = classify(items, &default_sections());

        assert_eq!(classified.buckets[0].title, ENHANCEMENT_PREFIX);
        assert_eq!(numbers(&classified.buckets[0].items), vec![1]);
        assert_eq!(classified.buckets[1].title, BUG_PREFIX);
        assert_eq!(numbers(&classified.buckets[1].items), vec![2]);
        assert_eq!(numbers(&classified.leftover), vec![3, 4]);
    }

    #[test]
    fn declared_order_is_priority() {
        let sections = vec![
            Section::new("Bugs", ["bug"]),
            Section::new("Features", ["enhancement"]),
        ];
        let items = vec![Item::issue(1, "both").with_labels(["bug", "enhancement"])];
        let classified = classify(items, &sections);
        assert_eq!(numbers(&classified.buckets[0].items), vec![1]);
        assert!(classified.buckets[1].items.is_empty());
    }

    #[test]
    fn no_sections_everything_leftover() {
        let items = vec![Item::issue(1, "a").with_labels(["bug"])];
        let classified = classify(items, &[]);
        assert!(classified.buckets.is_empty());
        assert_eq!(classified.leftover.len(), 1);
    }

    #[test]
    fn deterministic() {
        let items = vec![
            Item::issue(1, "a").with_labels(["bug"]),
            Item::issue(2, "b").with_labels(["enhancement"]),
        ];
        let once = classify(items.clone(), &default_sections());
        let twice = classify(items, &default_sections());
        assert_eq!(once, twice);
    }

    #[test]
    fn section_toml_shape() {
        let section: Section = toml::from_str("title = \"Docs\"\nlabels = [\"docs\"]").unwrap();
        assert_eq!(section, Section::new("Docs", ["docs"]));
    }
}
