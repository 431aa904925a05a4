//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Scopes
//!
//! The same schema is read from both scopes:
//! 1. Global: `$TAGSCRIBE_CONFIG`, `$XDG_CONFIG_HOME/tagscribe/config.toml`,
//!    or `~/.tagscribe/config.toml`
//! 2. Repo: `.tagscribe.toml` in the working directory
//!
//! `repository` only makes sense per repository and is ignored (with a
//! warning) in the global file.
//!
//! # Validation
//!
//! Config values are validated after parsing: patterns must compile, the
//! date format must be a valid strftime string, sections must name at least
//! one label, and concurrency must be positive.

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Settings file (either scope).
///
/// # Example
///
/// ```toml
/// repository = "octocat/hello-world"
/// exclude_labels = ["duplicate", "wontfix", "question"]
/// exclude_tags_regex = "v0\\."
/// author_link_as_tag = true
///
/// [[sections]]
/// title = "**Security fixes:**"
/// labels = ["security"]
///
/// [[sections]]
/// title = "**Fixed bugs:**"
/// labels = ["bug"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// `owner/repo` of the project (repo scope only)
    pub repository: Option<String>,

    /// Git remote used to discover the project (default: "origin")
    pub remote: Option<String>,

    /// Web host of the forge (default: "github.com")
    pub github_site: Option<String>,

    /// API base URL (default: "https://api.github.com")
    pub api_base: Option<String>,

    /// Bound on in-flight API requests
    pub max_concurrent_requests: Option<usize>,

    /// Output file (default: "CHANGELOG.md")
    pub output: Option<PathBuf>,

    /// Existing changelog appended to the output
    pub base: Option<PathBuf>,

    /// Document header (default: "# Change Log")
    pub header: Option<String>,

    /// Text placed before the header
    pub frontmatter: Option<String>,

    /// strftime format of window dates (default: "%Y-%m-%d")
    pub date_format: Option<String>,

    /// Label of the unreleased window
    pub unreleased_label: Option<String>,

    /// Release link template (`{}` or `%s` is replaced with the tag)
    pub release_url: Option<String>,

    /// Only pull requests merged into this branch
    pub release_branch: Option<String>,

    /// Heading for unclassified issues
    pub issue_prefix: Option<String>,

    /// Heading for unclassified pull requests
    pub merge_prefix: Option<String>,

    /// Only labeled items carrying one of these
    pub include_labels: Option<Vec<String>>,

    /// Drop items carrying any of these
    pub exclude_labels: Option<Vec<String>>,

    /// Drop these tags
    pub exclude_tags: Option<Vec<String>>,

    /// Drop tags matching this pattern (anchored at the start)
    pub exclude_tags_regex: Option<String>,

    /// Keep tags at or after this one
    pub since_tag: Option<String>,

    /// Credit pull request authors
    pub author: Option<bool>,

    /// Credit authors as `@login`
    pub author_link_as_tag: Option<bool>,

    /// Add compare links
    pub compare_link: Option<bool>,

    /// Add the unreleased window
    pub unreleased: Option<bool>,

    /// Show a date on the unreleased window
    pub unreleased_with_date: Option<bool>,

    /// Move items into the window named by their milestone
    pub filter_by_milestone: Option<bool>,

    /// Omit sub-section headings
    pub simple_list: Option<bool>,

    /// Keep issues without labels
    pub add_issues_wo_labels: Option<bool>,

    /// Keep pull requests without labels
    pub add_pr_wo_labels: Option<bool>,

    /// Sections, replacing the built-in ones
    pub sections: Option<Vec<SectionConfig>>,
}

/// A configured changelog section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    /// Heading of the section
    pub title: String,
    /// Labels routing items into it
    pub labels: Vec<String>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(repository) = &self.repository {
            let mut parts = repository.split('/');
            let valid = matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
            );
            if !valid {
                return Err(ConfigError::InvalidValue(format!(
                    "repository must be 'owner/repo', got '{}'",
                    repository
                )));
            }
        }

        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        if self.max_concurrent_requests == Some(0) {
            return Err(ConfigError::InvalidValue(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        if let Some(pattern) = &self.exclude_tags_regex {
            validate_pattern(pattern)?;
        }

        if let Some(format) = &self.date_format {
            validate_date_format(format)?;
        }

        if let Some(sections) = &self.sections {
            for section in sections {
                if section.title.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "section title cannot be empty".to_string(),
                    ));
                }
                if section.labels.is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "section '{}' must list at least one label",
                        section.title
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Check that an exclude pattern compiles.
pub fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    Regex::new(&format!("^(?:{})", pattern))
        .map(|_| ())
        .map_err(|e| {
            ConfigError::InvalidValue(format!("invalid exclude_tags_regex '{}': {}", pattern, e))
        })
}

/// Check that a strftime format is well formed.
pub fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidValue(format!(
            "invalid date_format '{}'",
            format
        )));
    }
    Ok(())
}
