//! cli::commands::generate
//!
//! Generate a changelog and write it to disk.
//!
//! # Algorithm
//!
//! 1. Load the global and repo config files
//! 2. Discover the project: positional argument, config, then git remote
//! 3. Discover the token: flag, git config, then environment
//! 4. Merge flags over config into [`GeneratorOptions`]
//! 5. Run the engine on a tokio runtime
//! 6. Write the document atomically, unless it is empty
//!
//! Nothing is written when the engine fails.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};

use crate::cli::args::GenerateArgs;
use crate::cli::Context;
use crate::core::base_changelog;
use crate::core::config::schema::validate_date_format;
use crate::core::config::Config;
use crate::core::output::write_changelog;
use crate::engine::item_filter::{default_exclude_labels, ItemFilterOptions};
use crate::engine::sections::{BUG_PREFIX, ENHANCEMENT_PREFIX};
use crate::engine::tag_filter::TagFilterOptions;
use crate::engine::{self, default_sections, GeneratorOptions, Section};
use crate::forge::github::{parse_repo_reference, GitHubForge, DEFAULT_API_BASE};
use crate::git::{self, Git};
use crate::ui::markdown::{RenderOptions, DEFAULT_HEADER};
use crate::ui::output;

/// Git config keys searched for a token, in order.
pub const TOKEN_CONFIG_KEYS: [&str; 2] = ["github.tagscribe.token", "github.token"];

/// Environment variable searched for a token.
pub const TOKEN_ENV: &str = "CHANGELOG_GITHUB_TOKEN";

const DEFAULT_SITE: &str = "github.com";

/// Generate a changelog.
pub fn generate(ctx: &Context, args: &GenerateArgs) -> Result<()> {
    let loaded = Config::load(Some(ctx.cwd.as_path())).context("failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            ctx.verbosity,
        );
    }
    let config = loaded.config;

    let git = Git::open(&ctx.cwd).ok();
    let site = args
        .github_site
        .as_deref()
        .unwrap_or_else(|| config.github_site());

    let remote_url = match git.as_ref() {
        // An explicit --remote must exist; the configured one may fall back.
        Some(git) => match args.remote.as_deref() {
            Some(remote) => git.remote_url(remote)?,
            None => git.remote_url_or_default(config.remote())?,
        },
        None => None,
    };
    let (owner, repo) = resolve_project(
        args.repository.as_deref(),
        config.repository(),
        remote_url.as_deref(),
        site,
    )?;
    tracing::info!(%owner, %repo, "generating changelog");

    let token = resolve_token(args.token.as_deref(), git.as_ref());
    if token.is_none() {
        output::warn(
            format!(
                "no token found; anonymous requests are limited to 60 per hour. \
                 Pass --token, set git config {}, or export {}",
                TOKEN_CONFIG_KEYS[0], TOKEN_ENV
            ),
            ctx.verbosity,
        );
    }

    let project_url = format!("https://{}/{}/{}", site, owner, repo);
    let mut options = build_options(args, &config, project_url)?;

    if let Some(base) = args.base.as_deref().or_else(|| config.base()) {
        let path = resolve_path(&ctx.cwd, base);
        let parsed = base_changelog::read(&path, &options.render.header)?;
        tracing::debug!(entries = parsed.entries.len(), "read base changelog");
        options.base = Some(parsed);
    }

    let api_base = api_base(args.api_base.as_deref().or_else(|| config.api_base()), site);
    let forge = GitHubForge::with_api_base(token, owner, repo, api_base);

    output::debug(format!("using {:?}", forge), ctx.verbosity);
    let rt = tokio::runtime::Runtime::new()?;
    let changelog = rt.block_on(engine::generate(&forge, &options))?;

    if changelog.is_empty() {
        output::print(
            "Nothing to write: no tagged releases with closed issues or merged pull requests.",
            ctx.verbosity,
        );
        return Ok(());
    }

    let target = resolve_path(
        &ctx.cwd,
        &args.output.clone().unwrap_or_else(|| config.output()),
    );
    let written = write_changelog(&target, &changelog.text, !args.no_overwrite)?;
    output::success(
        format!(
            "Wrote {} ({} releases, {} entries)",
            written.display(),
            changelog.windows,
            changelog.items
        ),
        ctx.verbosity,
    );
    Ok(())
}

/// Work out `(owner, repo)` from the positional argument, the repo config,
/// or the remote URL, in that order.
pub fn resolve_project(
    positional: Option<&str>,
    configured: Option<&str>,
    remote_url: Option<&str>,
    site: &str,
) -> Result<(String, String)> {
    if let Some(reference) = positional {
        return parse_repo_reference(reference, site).ok_or_else(|| {
            anyhow!(
                "'{}' is not a project on {}; expected OWNER/REPO or a project URL",
                reference,
                site
            )
        });
    }
    if let Some(reference) = configured {
        return parse_repo_reference(reference, site)
            .ok_or_else(|| anyhow!("invalid repository '{}' in config", reference));
    }
    match remote_url {
        Some(url) => parse_repo_reference(url, site).ok_or_else(|| {
            anyhow!(
                "remote URL '{}' does not point at {}; pass OWNER/REPO explicitly",
                url,
                site
            )
        }),
        None => bail!("could not determine the project; pass OWNER/REPO or run inside a clone"),
    }
}

/// Find an API token: flag, git config, then environment.
fn resolve_token(flag: Option<&str>, git: Option<&Git>) -> Option<String> {
    if let Some(token) = flag.filter(|t| !t.trim().is_empty()) {
        return Some(token.trim().to_string());
    }

    for key in TOKEN_CONFIG_KEYS {
        let value = match git {
            Some(git) => git.config_string(key),
            None => git::global_config_string(key),
        };
        match value {
            Ok(Some(token)) => {
                tracing::debug!(key, "token from git config");
                return Some(token);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(key, error = %e, "git config lookup failed"),
        }
    }

    std::env::var(TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// API base for `site`, unless one is given.
fn api_base(explicit: Option<&str>, site: &str) -> String {
    match explicit {
        Some(base) => base.to_string(),
        None if site == DEFAULT_SITE => DEFAULT_API_BASE.to_string(),
        None => format!("https://{}/api/v3", site),
    }
}

fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Merge flags over config into engine options. The base changelog is
/// attached by the caller.
pub fn build_options(
    args: &GenerateArgs,
    config: &Config,
    project_url: String,
) -> Result<GeneratorOptions> {
    let date_format = args
        .date_format
        .as_deref()
        .or_else(|| config.date_format());
    if let Some(format) = date_format {
        validate_date_format(format)?;
    }

    let defaults = RenderOptions::default();
    let render = RenderOptions {
        header: first(&args.header, config.header()).unwrap_or_else(|| DEFAULT_HEADER.to_string()),
        frontmatter: first(&args.frontmatter, config.frontmatter()),
        project_url,
        release_url: first(&args.release_url, config.release_url()),
        date_format: date_format.map_or(defaults.date_format, str::to_string),
        simple_list: args.simple_list || config.simple_list(),
        author: !args.no_author && config.author(),
        author_link_as_tag: args.author_link_as_tag || config.author_link_as_tag(),
        unreleased_with_date: args.unreleased_with_date || config.unreleased_with_date(),
        compare_link: !args.no_compare_link && config.compare_link(),
        tag_separator: args.tag_separator.clone(),
        issue_prefix: first(&args.issue_prefix, config.issue_prefix())
            .unwrap_or(defaults.issue_prefix),
        merge_prefix: first(&args.merge_prefix, config.merge_prefix())
            .unwrap_or(defaults.merge_prefix),
    };

    let tags = TagFilterOptions {
        since_tag: first(&args.since_tag, config.since_tag()),
        base_since_tag: None,
        between_tags: args.between_tags.clone(),
        due_tag: args.due_tag.clone(),
        exclude_tags: list(&args.exclude_tags, config.exclude_tags()).unwrap_or_default(),
        exclude_tags_regex: first(&args.exclude_tags_regex, config.exclude_tags_regex()),
    };

    let items = ItemFilterOptions {
        include_issues: !args.no_issues,
        include_pull_requests: !args.no_pull_requests,
        include_labels: list(&args.include_labels, config.include_labels()).unwrap_or_default(),
        exclude_labels: list(&args.exclude_labels, config.exclude_labels())
            .unwrap_or_else(default_exclude_labels),
        add_issues_wo_labels: !args.no_issues_wo_labels && config.add_issues_wo_labels(),
        add_pr_wo_labels: !args.no_pr_wo_labels && config.add_pr_wo_labels(),
    };

    let max_concurrent_requests = args
        .max_concurrent_requests
        .map(|n| n.get())
        .or_else(|| config.max_concurrent_requests())
        .unwrap_or(engine::DEFAULT_MAX_CONCURRENT_REQUESTS);

    Ok(GeneratorOptions {
        tags,
        items,
        sections: build_sections(args, config),
        max_issues: args.max_issues,
        release_branch: first(&args.release_branch, config.release_branch()),
        include_unreleased: !args.no_unreleased && config.unreleased(),
        unreleased_only: args.unreleased_only,
        unreleased_label: first(&args.unreleased_label, config.unreleased_label())
            .unwrap_or_else(|| engine::DEFAULT_UNRELEASED_LABEL.to_string()),
        future_release: args.future_release.clone(),
        filter_by_milestone: !args.no_filter_by_milestone && config.filter_by_milestone(),
        max_concurrent_requests,
        render,
        base: None,
    })
}

/// Sections from flags, else config, else the built-in ones.
///
/// The bug/enhancement flags reshape the built-in pair and take precedence
/// over configured sections.
fn build_sections(args: &GenerateArgs, config: &Config) -> Vec<Section> {
    if args.overrides_sections() {
        let enhancement_labels = if args.enhancement_labels.is_empty() {
            vec!["enhancement".to_string(), "Enhancement".to_string()]
        } else {
            args.enhancement_labels.clone()
        };
        let bug_labels = if args.bug_labels.is_empty() {
            vec!["bug".to_string(), "Bug".to_string()]
        } else {
            args.bug_labels.clone()
        };
        return vec![
            Section::new(
                args.enhancement_label.as_deref().unwrap_or(ENHANCEMENT_PREFIX),
                enhancement_labels,
            ),
            Section::new(args.bugs_label.as_deref().unwrap_or(BUG_PREFIX), bug_labels),
        ];
    }

    match config.sections() {
        Some(configured) => configured
            .iter()
            .map(|s| Section::new(s.title.clone(), s.labels.iter().cloned()))
            .collect(),
        None => default_sections(),
    }
}

fn first(flag: &Option<String>, configured: Option<&str>) -> Option<String> {
    flag.clone().or_else(|| configured.map(str::to_string))
}

fn list(flag: &[String], configured: Option<&[String]>) -> Option<Vec<String>> {
    if flag.is_empty() {
        configured.map(<[String]>::to_vec)
    } else {
        Some(flag.to_vec())
    }
}
