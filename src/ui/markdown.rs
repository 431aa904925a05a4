//! ui::markdown
//!
//! Pure functions rendering changelog windows as markdown.
//!
//! # Design
//!
//! This module contains only pure functions: they take the already
//! classified items of a window plus rendering options and return strings.
//! Nothing here touches the forge or the filesystem.
//!
//! # Example Output
//!
//! ```markdown
//! ## [v1.1.0](https://github.com/org/repo/tree/v1.1.0) (2015-03-24)
//! [Full Changelog](https://github.com/org/repo/compare/v1.0.0...v1.1.0)
//!
//! **Fixed bugs:**
//!
//! - Crash on \_start\_ [\#12](https://github.com/org/repo/issues/12)
//!
//! **Merged pull requests:**
//!
//! - Add retry [\#14](https://github.com/org/repo/pull/14) ([alice](https://github.com/alice))
//! ```

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::core::types::{Item, REPO_CREATED_TAG_NAME};
use crate::engine::sections::{Bucket, ISSUE_PREFIX, MERGE_PREFIX};

/// Default document header.
pub const DEFAULT_HEADER: &str = "# Change Log";

/// Default date format for window headers.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// First line of the document.
    pub header: String,
    /// Text placed before the header.
    pub frontmatter: Option<String>,
    /// Web URL of the project, e.g. `https://github.com/org/repo`.
    pub project_url: String,
    /// Release link template; `{}` or `%s` is replaced with the tag link.
    pub release_url: Option<String>,
    /// strftime format for window dates.
    pub date_format: String,
    /// Omit sub-section headings.
    pub simple_list: bool,
    /// Credit pull request authors.
    pub author: bool,
    /// Credit authors as `@login` instead of a profile link.
    pub author_link_as_tag: bool,
    /// Show a date on the unreleased window.
    pub unreleased_with_date: bool,
    /// Add a compare link under each window header.
    pub compare_link: bool,
    /// Text placed between windows.
    pub tag_separator: Option<String>,
    /// Heading for unclassified issues.
    pub issue_prefix: String,
    /// Heading for unclassified pull requests.
    pub merge_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            frontmatter: None,
            project_url: String::new(),
            release_url: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            simple_list: false,
            author: true,
            author_link_as_tag: false,
            unreleased_with_date: false,
            compare_link: true,
            tag_separator: None,
            issue_prefix: ISSUE_PREFIX.to_string(),
            merge_prefix: MERGE_PREFIX.to_string(),
        }
    }
}

/// Header data of one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHeader<'a> {
    /// Displayed release name.
    pub name: &'a str,
    /// Ref used in links (`HEAD` for the unreleased window).
    pub link: &'a str,
    /// Instant of the newer boundary.
    pub date: DateTime<Utc>,
    /// Ref of the older boundary.
    pub older_link: &'a str,
    pub unreleased: bool,
}

/// Classified content of one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowContent {
    /// Named sections, issues before pull requests within each.
    pub buckets: Vec<Bucket>,
    /// Issues no section claimed.
    pub leftover_issues: Vec<Item>,
    /// Pull requests no section claimed.
    pub leftover_pulls: Vec<Item>,
}

impl WindowContent {
    pub fn is_empty(&self) -> bool {
        self.leftover_issues.is_empty()
            && self.leftover_pulls.is_empty()
            && self.buckets.iter().all(|b| b.items.is_empty())
    }
}

/// Backslash-escape characters markdown would interpret.
///
/// # Example
///
/// ```
/// use tagscribe::ui::markdown::encapsulate;
///
/// assert_eq!(encapsulate("fix [a] #1"), r"fix \[a\] \#1");
/// ```
pub fn encapsulate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '<' | '>' | '*' | '_' | '(' | ')' | '[' | ']' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One item as a markdown line (without the list marker).
pub fn item_line(item: &Item, options: &RenderOptions) -> String {
    let mut line = format!(
        "{} [\\#{}]({})",
        encapsulate(&item.title),
        item.number,
        item.html_url
    );

    if item.is_pull_request() && options.author {
        match &item.author {
            None => line.push_str(" (Null user)"),
            Some(author) if options.author_link_as_tag => {
                let _ = write!(line, " (@{})", author.login);
            }
            Some(author) => {
                let _ = write!(line, " ([{}]({}))", author.login, author.html_url);
            }
        }
    }
    line
}

/// A headed list of items; empty input renders nothing.
pub fn sub_section(items: &[Item], prefix: &str, options: &RenderOptions) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    if !options.simple_list {
        let _ = write!(out, "{}\n\n", prefix);
    }
    for item in items {
        let _ = writeln!(out, "- {}", item_line(item, options));
    }
    out.push('\n');
    out
}

/// Resolve the release link for a tag.
pub fn release_url(link: &str, options: &RenderOptions) -> String {
    match &options.release_url {
        Some(template) if template.contains("{}") => template.replace("{}", link),
        Some(template) if template.contains("%s") => template.replace("%s", link),
        Some(template) => template.clone(),
        None => format!("{}/tree/{}", options.project_url, link),
    }
}

fn format_date(date: DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        out.clear();
        let _ = write!(out, "{}", date.format(DEFAULT_DATE_FORMAT));
    }
    out
}

/// A window's header line and optional compare link, followed by a blank line.
pub fn window_header(header: &WindowHeader<'_>, options: &RenderOptions) -> String {
    let url = release_url(header.link, options);
    let mut out = if header.unreleased && !options.unreleased_with_date {
        format!("## [{}]({})\n", header.name, url)
    } else {
        format!(
            "## [{}]({}) ({})\n",
            header.name,
            url,
            format_date(header.date, &options.date_format)
        )
    };

    if options.compare_link && header.older_link != REPO_CREATED_TAG_NAME {
        let _ = writeln!(
            out,
            "[Full Changelog]({}/compare/{}...{})",
            options.project_url, header.older_link, header.link
        );
    }
    out.push('\n');
    out
}

/// A complete window; empty content renders nothing.
pub fn window(header: &WindowHeader<'_>, content: &WindowContent, options: &RenderOptions) -> String {
    if content.is_empty() {
        return String::new();
    }
    let mut out = window_header(header, options);
    for bucket in &content.buckets {
        out.push_str(&sub_section(&bucket.items, &bucket.title, options));
    }
    out.push_str(&sub_section(&content.leftover_issues, &options.issue_prefix, options));
    out.push_str(&sub_section(&content.leftover_pulls, &options.merge_prefix, options));
    out
}

/// Assemble the document from rendered windows (newest first) and the
/// optional base changelog text.
pub fn document(windows: &[String], base: Option<&str>, options: &RenderOptions) -> String {
    let mut out = String::new();
    if let Some(front) = &options.frontmatter {
        out.push_str(front);
    }
    let _ = write!(out, "{}\n\n", options.header);

    let rendered: Vec<&str> = windows
        .iter()
        .map(String::as_str)
        .filter(|w| !w.is_empty())
        .collect();
    match &options.tag_separator {
        Some(separator) => out.push_str(&rendered.join(separator)),
        None => out.push_str(&rendered.concat()),
    }

    if let Some(base) = base {
        out.push_str(base);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn options() -> RenderOptions {
        RenderOptions {
            project_url: "https://github.com/org/repo".into(),
            ..Default::default()
        }
    }

    fn issue() -> Item {
        Item::issue(12, "Crash on _start_").with_url("https://github.com/org/repo/issues/12")
    }

    fn pull() -> Item {
        Item::pull_request(14, "Add retry")
            .with_url("https://github.com/org/repo/pull/14")
            .with_author("alice", "https://github.com/alice")
    }

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 3, 24, 10, 0, 0).unwrap()
    }

    #[test]
    fn encapsulate_escapes_specials() {
        assert_eq!(encapsulate("<a>*b*_c_(d)[e]#f"), r"\<a\>\*b\*\_c\_\(d\)\[e\]\#f");
        assert_eq!(encapsulate("plain text"), "plain text");
    }

    mod item_line {
        use super::*;

        #[test]
        fn issue_has_no_author() {
            assert_eq!(
                item_line(&issue(), &options()),
                r"Crash on \_start\_ [\#12](https://github.com/org/repo/issues/12)"
            );
        }

        #[test]
        fn pull_request_author_link() {
            assert_eq!(
                item_line(&pull(), &options()),
                r"Add retry [\#14](https://github.com/org/repo/pull/14) ([alice](https://github.com/alice))"
            );
        }

        #[test]
        fn pull_request_author_as_tag() {
            let opts = RenderOptions {
                author_link_as_tag: true,
                ..options()
            };
            assert!(item_line(&pull(), &opts).ends_with(" (@alice)"));
        }

        #[test]
        fn pull_request_without_user() {
            let pr = Item::pull_request(1, "x").with_url("u");
            assert!(item_line(&pr, &options()).ends_with(" (Null user)"));
        }

        #[test]
        fn author_disabled() {
            let opts = RenderOptions {
                author: false,
                ..options()
            };
            assert!(item_line(&pull(), &opts).ends_with("(https://github.com/org/repo/pull/14)"));
        }
    }

    mod sub_section {
        use super::*;

        #[test]
        fn with_prefix() {
            let out = sub_section(&[issue()], "**Fixed bugs:**", &options());
            assert!(out.starts_with("**Fixed bugs:**\n\n- Crash"));
            assert!(out.ends_with(")\n\n"));
        }

        #[test]
        fn simple_list_omits_prefix() {
            let opts = RenderOptions {
                simple_list: true,
                ..options()
            };
            let out = sub_section(&[issue()], "**Fixed bugs:**", &opts);
            assert!(out.starts_with("- Crash"));
        }

        #[test]
        fn empty_renders_nothing() {
            assert_eq!(sub_section(&[], "**Fixed bugs:**", &options()), "");
        }
    }

    mod header {
        use super::*;

        fn header(unreleased: bool, older: &'static str) -> WindowHeader<'static> {
            WindowHeader {
                name: if unreleased { "Unreleased" } else { "v1.1" },
                link: if unreleased { "HEAD" } else { "v1.1" },
                date: date(),
                older_link: older,
                unreleased,
            }
        }

        #[test]
        fn dated_with_compare_link() {
            assert_eq!(
                window_header(&header(false, "v1.0"), &options()),
                "## [v1.1](https://github.com/org/repo/tree/v1.1) (2015-03-24)\n\
                 [Full Changelog](https://github.com/org/repo/compare/v1.0...v1.1)\n\n"
            );
        }

        #[test]
        fn unreleased_has_no_date() {
            let out = window_header(&header(true, "v1.1"), &options());
            assert!(out.starts_with("## [Unreleased](https://github.com/org/repo/tree/HEAD)\n"));
            assert!(out.contains("compare/v1.1...HEAD"));
        }

        #[test]
        fn unreleased_with_date() {
            let opts = RenderOptions {
                unreleased_with_date: true,
                ..options()
            };
            let out = window_header(&header(true, "v1.1"), &opts);
            assert!(out.starts_with("## [Unreleased](https://github.com/org/repo/tree/HEAD) (2015-03-24)\n"));
        }

        #[test]
        fn no_compare_link_from_repo_creation() {
            let out = window_header(&header(false, REPO_CREATED_TAG_NAME), &options());
            assert!(!out.contains("Full Changelog"));
        }

        #[test]
        fn custom_release_url_and_date_format() {
            let opts = RenderOptions {
                release_url: Some("https://example.com/releases/%s".into()),
                date_format: "%d.%m.%Y".into(),
                compare_link: false,
                ..options()
            };
            assert_eq!(
                window_header(&header(false, "v1.0"), &opts),
                "## [v1.1](https://example.com/releases/v1.1) (24.03.2015)\n\n"
            );
        }
    }

    #[test]
    fn empty_window_renders_nothing() {
        let header = WindowHeader {
            name: "v1",
            link: "v1",
            date: date(),
            older_link: "v0",
            unreleased: false,
        };
        let content = WindowContent {
            buckets: vec![Bucket {
                title: "**Fixed bugs:**".into(),
                items: Vec::new(),
            }],
            ..Default::default()
        };
        assert_eq!(window(&header, &content, &options()), "");
    }

    #[test]
    fn window_orders_sections_then_leftovers() {
        let header = WindowHeader {
            name: "v1",
            link: "v1",
            date: date(),
            older_link: "v0",
            unreleased: false,
        };
        let content = WindowContent {
            buckets: vec![Bucket {
                title: "**Fixed bugs:**".into(),
                items: vec![issue()],
            }],
            leftover_issues: vec![Item::issue(3, "other").with_url("u3")],
            leftover_pulls: vec![pull()],
        };
        let out = window(&header, &content, &options());
        let bugs = out.find("**Fixed bugs:**").unwrap();
        let closed = out.find(ISSUE_PREFIX).unwrap();
        let merged = out.find(MERGE_PREFIX).unwrap();
        assert!(bugs < closed && closed < merged);
    }

    #[test]
    fn document_layout() {
        let opts = RenderOptions {
            frontmatter: Some("---\ntitle: x\n---\n".into()),
            tag_separator: Some("---\n".into()),
            ..options()
        };
        let out = document(
            &["A\n".to_string(), String::new(), "B\n".to_string()],
            Some("## v0.1\nold\n"),
            &opts,
        );
        assert_eq!(out, "---\ntitle: x\n---\n# Change Log\n\nA\n---\nB\n## v0.1\nold\n");
    }
}
