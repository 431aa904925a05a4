//! engine::options
//!
//! Everything one generation run is parameterized by.

use super::context::DEFAULT_MAX_CONCURRENT_REQUESTS;
use super::item_filter::ItemFilterOptions;
use super::sections::{default_sections, Section};
use super::tag_filter::TagFilterOptions;
use crate::core::base_changelog::BaseChangelog;
use crate::ui::markdown::RenderOptions;

/// Default label of the unreleased window.
pub const DEFAULT_UNRELEASED_LABEL: &str = "Unreleased";

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub tags: TagFilterOptions,
    pub items: ItemFilterOptions,
    /// Sections in priority order.
    pub sections: Vec<Section>,
    /// Stop fetching closed items after this many.
    pub max_issues: Option<usize>,
    /// Only pull requests merged into this base branch.
    pub release_branch: Option<String>,
    /// Add a window for changes since the newest tag.
    pub include_unreleased: bool,
    /// Render only the unreleased window.
    pub unreleased_only: bool,
    pub unreleased_label: String,
    /// Name the unreleased window after an upcoming release.
    pub future_release: Option<String>,
    /// Move items into the window named by their milestone.
    pub filter_by_milestone: bool,
    pub max_concurrent_requests: usize,
    pub render: RenderOptions,
    /// Existing changelog appended to the output.
    pub base: Option<BaseChangelog>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            tags: TagFilterOptions::default(),
            items: ItemFilterOptions::default(),
            sections: default_sections(),
            max_issues: None,
            release_branch: None,
            include_unreleased: true,
            unreleased_only: false,
            unreleased_label: DEFAULT_UNRELEASED_LABEL.to_string(),
            future_release: None,
            filter_by_milestone: true,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            render: RenderOptions::default(),
            base: None,
        }
    }
}

impl GeneratorOptions {
    /// Label (and link) of the unreleased window.
    pub fn unreleased_window_label(&self) -> &str {
        self.future_release
            .as_deref()
            .unwrap_or(&self.unreleased_label)
    }

    /// Tag filter options with the base changelog's newest version filled in.
    pub fn effective_tag_filter(&self) -> TagFilterOptions {
        let mut tags = self.tags.clone();
        if tags.base_since_tag.is_none() {
            tags.base_since_tag = self
                .base
                .as_ref()
                .and_then(|b| b.newest_version())
                .map(str::to_string);
        }
        tags
    }
}
