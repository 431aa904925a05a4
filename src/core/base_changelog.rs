//! core::base_changelog
//!
//! Reader for an existing changelog whose contents are appended to the
//! generated document.
//!
//! # Format
//!
//! The file is split at `## ` headings. Recognized heading shapes:
//!
//! ```text
//! ## [v1.0.2](https://github.com/org/repo/tree/v1.0.2) (2015-03-24)
//! ## [v1.0.2](https://github.com/org/repo/tree/v1.0.2)
//! ## v1.0.2 (2015-03-24)
//! ## v1.0.2
//! ```
//!
//! The newest (first) version tells the tag filter where generated history
//! can stop.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors from reading a base changelog.
#[derive(Debug, Error)]
pub enum BaseChangelogError {
    /// The file could not be read.
    #[error("failed to read base changelog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One version section of a base changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub version: String,
    pub url: Option<String>,
    pub date: Option<String>,
    /// Text between this heading and the next.
    pub content: String,
}

/// A parsed base changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseChangelog {
    /// File contents, verbatim.
    pub raw: String,
    /// Version sections, newest first as written.
    pub entries: Vec<ChangelogEntry>,
}

impl BaseChangelog {
    /// Parse changelog text, ignoring a leading `header`.
    pub fn parse(raw: impl Into<String>, header: &str) -> Self {
        let raw = raw.into();
        let entries = parse_entries(&raw, header);
        Self { raw, entries }
    }

    /// Version of the first section, if any.
    pub fn newest_version(&self) -> Option<&str> {
        self.entries.first().map(|e| e.version.as_str())
    }
}

/// Read and parse the changelog at `path`.
pub fn read(path: &Path, header: &str) -> Result<BaseChangelog, BaseChangelogError> {
    let raw = fs::read_to_string(path).map_err(|source| BaseChangelogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BaseChangelog::parse(raw, header))
}

fn heading_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?m)^## .+$").expect("valid regex"),
            Regex::new(r"^## \[(?P<version>.+?)\]\((?P<url>.+?)\)(?: \((?P<date>.+?)\))?$")
                .expect("valid regex"),
            Regex::new(r"^## (?P<version>.+?)(?: \((?P<date>.+?)\))?$")
                .expect("valid regex"),
        ]
    })
}

/// Parse one heading line into `(version, url, date)`.
pub fn parse_heading(heading: &str) -> Option<(String, Option<String>, Option<String>)> {
    let [_, linked, plain] = heading_patterns();
    let heading = heading.trim_end();

    let caps = linked.captures(heading).or_else(|| plain.captures(heading))?;
    let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
    Some((group("version")?, group("url"), group("date")))
}

fn parse_entries(raw: &str, header: &str) -> Vec<ChangelogEntry> {
    let body = raw.trim_start();
    let body = body.strip_prefix(header).unwrap_or(body).trim();
    let [sections, _, _] = heading_patterns();

    let headings: Vec<_> = sections.find_iter(body).collect();
    headings
        .iter()
        .enumerate()
        .filter_map(|(i, m)| {
            let end = headings.get(i + 1).map_or(body.len(), |next| next.start());
            let (version, url, date) = parse_heading(m.as_str())?;
            Some(ChangelogEntry {
                version,
                url,
                date,
                content: body[m.end()..end].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    mod parse_heading {
        use super::*;

        #[test]
        fn linked_with_date() {
            assert_eq!(
                parse_heading("## [v1.0.2](https://github.com/org/repo/tree/v1.0.2) (2015-03-24)"),
                Some((
                    "v1.0.2".to_string(),
                    Some("https://github.com/org/repo/tree/v1.0.2".to_string()),
                    Some("2015-03-24".to_string())
                ))
            );
        }

        #[test]
        fn linked_without_date() {
            let (version, url, date) =
                parse_heading("## [v1.0.2](https://example.com/v1.0.2)").unwrap();
            assert_eq!(version, "v1.0.2");
            assert_eq!(url.as_deref(), Some("https://example.com/v1.0.2"));
            assert!(date.is_none());
        }

        #[test]
        fn plain_with_date() {
            assert_eq!(
                parse_heading("## v1.0.2 (2015-03-24)"),
                Some(("v1.0.2".to_string(), None, Some("2015-03-24".to_string())))
            );
        }

        #[test]
        fn plain() {
            assert_eq!(
                parse_heading("## v1.0.2"),
                Some(("v1.0.2".to_string(), None, None))
            );
        }

        #[test]
        fn not_a_heading() {
            assert!(parse_heading("# Change Log").is_none());
        }
    }

    #[test]
    fn parse_document() {
        let text = "# Change Log\n\n\
                    ## [v1.1](https://x/tree/v1.1) (2015-03-24)\n\
                    - fix a\n\n\
                    ## v1.0\n\
                    - initial\n";
        let changelog = BaseChangelog::parse(text, "# Change Log");
        assert_eq!(changelog.entries.len(), 2);
        assert_eq!(changelog.newest_version(), Some("v1.1"));
        assert_eq!(changelog.entries[0].date.as_deref(), Some("2015-03-24"));
        assert!(changelog.entries[0].content.contains("- fix a"));
        assert_eq!(changelog.entries[1].version, "v1.0");
        assert!(changelog.entries[1].content.contains("- initial"));
        assert_eq!(changelog.raw, text);
    }

    #[test]
    fn no_headings() {
        let changelog = BaseChangelog::parse("# Change Log\n\nnothing yet\n", "# Change Log");
        assert!(changelog.entries.is_empty());
        assert!(changelog.newest_version().is_none());
    }

    #[test]
    fn read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "## v2.0 (2016-01-01)\n- thing\n").unwrap();
        let changelog = read(file.path(), "# Change Log").unwrap();
        assert_eq!(changelog.newest_version(), Some("v2.0"));
    }

    #[test]
    fn read_missing_file() {
        let err = read(Path::new("/nonexistent/CHANGELOG.md"), "# Change Log").unwrap_err();
        assert!(err.to_string().contains("failed to read base changelog"));
    }
}
