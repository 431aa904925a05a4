//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `-v` / `--verbose`: More log output (repeatable)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Flags and config
//!
//! Boolean options that default on come as `--no-*` switches; options that
//! default off come as plain switches. A switch given on the command line
//! wins over the config files, an absent switch defers to them.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tagscribe - changelogs from tags, issues, and pull requests
#[derive(Parser, Debug)]
#[command(name = "tagscribe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tagscribe was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Default tracing filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match (self.verbose, self.debug) {
            (0, false) => "warn",
            (1, false) => "info",
            (0..=2, _) => "debug",
            _ => "trace",
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a changelog
    #[command(
        name = "generate",
        long_about = "Generate a changelog from a repository's tags, closed issues, \
            and merged pull requests.\n\n\
            Every closed issue and merged pull request is attributed to the release \
            whose tag first contains the commit that resolved it, then grouped into \
            sections by label.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Project discovered from the 'origin' remote
    tagscribe generate

    # Explicit project, token from the environment
    CHANGELOG_GITHUB_TOKEN=... tagscribe generate octocat/hello-world

    # Only the range between two releases
    tagscribe generate --between-tags v1.0,v1.2

    # Keep an old hand-written changelog below the generated part
    tagscribe generate --base HISTORY.md

TOKEN LOOKUP:
    --token, then git config github.tagscribe.token, then github.token,
    then $CHANGELOG_GITHUB_TOKEN. Without a token the anonymous rate limit
    applies."
    )]
    Generate(GenerateArgs),

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    tagscribe completion bash > ~/.local/share/bash-completion/completions/tagscribe

    # Zsh
    tagscribe completion zsh > ~/.zfunc/_tagscribe

    # Fish
    tagscribe completion fish > ~/.config/fish/completions/tagscribe.fish

    # PowerShell
    tagscribe completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options of `tagscribe generate`.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Project as `owner/repo` or a URL; defaults to the git remote
    #[arg(value_name = "OWNER/REPO")]
    pub repository: Option<String>,

    // ========== Connection ==========
    /// API token
    #[arg(short, long)]
    pub token: Option<String>,

    /// Git remote used to discover the project
    #[arg(long)]
    pub remote: Option<String>,

    /// Web host of the forge, e.g. a GitHub Enterprise host
    #[arg(long, value_name = "HOST")]
    pub github_site: Option<String>,

    /// API base URL, e.g. https://ghe.example.com/api/v3
    #[arg(long = "github-api", value_name = "URL")]
    pub api_base: Option<String>,

    /// Bound on in-flight API requests
    #[arg(long, value_name = "N")]
    pub max_concurrent_requests: Option<NonZeroUsize>,

    /// Stop fetching closed issues after this many
    #[arg(long, value_name = "N")]
    pub max_issues: Option<usize>,

    // ========== Output ==========
    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Rename around an existing output file instead of replacing it
    #[arg(long)]
    pub no_overwrite: bool,

    /// Existing changelog appended below the generated part
    #[arg(long, value_name = "FILE")]
    pub base: Option<PathBuf>,

    /// Document header
    #[arg(long = "header-label", value_name = "TEXT")]
    pub header: Option<String>,

    /// Text placed before the header
    #[arg(long, value_name = "TEXT")]
    pub frontmatter: Option<String>,

    /// strftime format of window dates
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Release link template; {} or %s is replaced with the tag
    #[arg(long, value_name = "URL")]
    pub release_url: Option<String>,

    /// Text placed between windows
    #[arg(long, value_name = "TEXT")]
    pub tag_separator: Option<String>,

    /// Omit sub-section headings
    #[arg(long)]
    pub simple_list: bool,

    /// Do not credit pull request authors
    #[arg(long)]
    pub no_author: bool,

    /// Credit authors as @login
    #[arg(long)]
    pub author_link_as_tag: bool,

    /// Do not add compare links
    #[arg(long)]
    pub no_compare_link: bool,

    // ========== Windows ==========
    /// Do not add the unreleased window
    #[arg(long, conflicts_with = "unreleased_only")]
    pub no_unreleased: bool,

    /// Only the unreleased window
    #[arg(long)]
    pub unreleased_only: bool,

    /// Label of the unreleased window
    #[arg(long, value_name = "TEXT")]
    pub unreleased_label: Option<String>,

    /// Show a date on the unreleased window
    #[arg(long)]
    pub unreleased_with_date: bool,

    /// Name the unreleased window after an upcoming release
    #[arg(long, value_name = "TAG")]
    pub future_release: Option<String>,

    /// Do not move items into the window named by their milestone
    #[arg(long)]
    pub no_filter_by_milestone: bool,

    // ========== Tags ==========
    /// Keep tags at or after this one
    #[arg(long, value_name = "TAG")]
    pub since_tag: Option<String>,

    /// Keep tags at or before this one
    #[arg(long, value_name = "TAG")]
    pub due_tag: Option<String>,

    /// Keep only the range spanned by these tags
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    pub between_tags: Vec<String>,

    /// Drop these tags
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    pub exclude_tags: Vec<String>,

    /// Drop tags matching this pattern (anchored at the start)
    #[arg(long, value_name = "REGEX")]
    pub exclude_tags_regex: Option<String>,

    // ========== Items ==========
    /// Leave out issues
    #[arg(long)]
    pub no_issues: bool,

    /// Leave out pull requests
    #[arg(long)]
    pub no_pull_requests: bool,

    /// Leave out issues without labels
    #[arg(long)]
    pub no_issues_wo_labels: bool,

    /// Leave out pull requests without labels
    #[arg(long)]
    pub no_pr_wo_labels: bool,

    /// Only labeled items carrying one of these
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub include_labels: Vec<String>,

    /// Drop items carrying any of these
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub exclude_labels: Vec<String>,

    /// Only pull requests merged into this branch
    #[arg(long, value_name = "BRANCH")]
    pub release_branch: Option<String>,

    // ========== Sections ==========
    /// Labels of the bug section
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub bug_labels: Vec<String>,

    /// Labels of the enhancement section
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub enhancement_labels: Vec<String>,

    /// Heading of the bug section
    #[arg(long, value_name = "TEXT")]
    pub bugs_label: Option<String>,

    /// Heading of the enhancement section
    #[arg(long, value_name = "TEXT")]
    pub enhancement_label: Option<String>,

    /// Heading for unclassified issues
    #[arg(long = "issues-label", value_name = "TEXT")]
    pub issue_prefix: Option<String>,

    /// Heading for unclassified pull requests
    #[arg(long = "pr-label", value_name = "TEXT")]
    pub merge_prefix: Option<String>,
}

impl GenerateArgs {
    /// Whether any option reshapes the built-in sections.
    pub fn overrides_sections(&self) -> bool {
        !self.bug_labels.is_empty()
            || !self.enhancement_labels.is_empty()
            || self.bugs_label.is_some()
            || self.enhancement_label.is_some()
    }
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_with_lists() {
        let cli = parse(&[
            "tagscribe",
            "generate",
            "octocat/hello-world",
            "--between-tags",
            "v1.0,v1.2",
            "--exclude-labels",
            "wontfix,duplicate",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.repository.as_deref(), Some("octocat/hello-world"));
        assert_eq!(args.between_tags, vec!["v1.0", "v1.2"]);
        assert_eq!(args.exclude_labels, vec!["wontfix", "duplicate"]);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let result = Cli::try_parse_from([
            "tagscribe",
            "generate",
            "--max-concurrent-requests",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unreleased_flags_conflict() {
        let result = Cli::try_parse_from([
            "tagscribe",
            "generate",
            "--no-unreleased",
            "--unreleased-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn log_levels() {
        assert_eq!(parse(&["tagscribe", "completion", "bash"]).log_level(), "warn");
        assert_eq!(parse(&["tagscribe", "-q", "completion", "bash"]).log_level(), "error");
        assert_eq!(parse(&["tagscribe", "-v", "completion", "bash"]).log_level(), "info");
        assert_eq!(parse(&["tagscribe", "-vv", "completion", "bash"]).log_level(), "debug");
        assert_eq!(parse(&["tagscribe", "--debug", "completion", "bash"]).log_level(), "debug");
        assert_eq!(parse(&["tagscribe", "-vvv", "completion", "bash"]).log_level(), "trace");
    }

    #[test]
    fn section_overrides_detected() {
        let mut args = GenerateArgs::default();
        assert!(!args.overrides_sections());
        args.bug_labels = vec!["defect".into()];
        assert!(args.overrides_sections());
    }
}
