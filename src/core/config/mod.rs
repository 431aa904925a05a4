//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! tagscribe has two configuration scopes sharing one schema:
//! - **Global**: User-level defaults
//! - **Repo**: Per-project overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TAGSCRIBE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tagscribe/config.toml`
//! 3. `~/.tagscribe/config.toml`
//!
//! # Repo Config Location
//!
//! `.tagscribe.toml` in the project directory.
//!
//! # Example
//!
//! ```no_run
//! use tagscribe::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("Remote: {}", config.remote());
//! if let Some(repo) = config.repository() {
//!     println!("Repository: {}", repo);
//! }
//! ```

pub mod schema;

pub use schema::{ConfigFile, SectionConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the repo-scope config.
pub const REPO_CONFIG_FILE: &str = ".tagscribe.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: a value set in the repo file wins over the
/// global file, which wins over the built-in default.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Repository configuration (if present)
    pub repo: Option<ConfigFile>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Build a config from already-parsed scopes.
    pub fn from_scopes(global: ConfigFile, repo: Option<ConfigFile>) -> Self {
        Self {
            global,
            repo,
            global_path: None,
            repo_path: None,
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads `.tagscribe.toml` from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (mut global, global_path) = Self::load_global()?;

        let (repo, repo_path) = match project_dir {
            Some(dir) => Self::load_repo(dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        if global.repository.is_some() {
            if let Some(path) = &global_path {
                warnings.push(ConfigWarning {
                    message: "'repository' is ignored in the global config".to_string(),
                    path: path.clone(),
                });
            }
            global.repository = None;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("TAGSCRIBE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("tagscribe/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".tagscribe/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((ConfigFile::default(), None))
    }

    fn load_repo(dir: &Path) -> Result<(Option<ConfigFile>, Option<PathBuf>), ConfigError> {
        let path = dir.join(REPO_CONFIG_FILE);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// First value set, repo scope before global.
    fn pick<'a, T>(&'a self, field: impl Fn(&'a ConfigFile) -> Option<T>) -> Option<T> {
        self.repo
            .as_ref()
            .and_then(&field)
            .or_else(|| field(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the configured `owner/repo`.
    pub fn repository(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.repository.as_deref())
    }

    /// Get the remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.pick(|c| c.remote.as_deref()).unwrap_or("origin")
    }

    /// Get the forge web host.
    ///
    /// Defaults to "github.com" if not configured.
    pub fn github_site(&self) -> &str {
        self.pick(|c| c.github_site.as_deref())
            .unwrap_or("github.com")
    }

    /// Get the API base URL, if overridden.
    pub fn api_base(&self) -> Option<&str> {
        self.pick(|c| c.api_base.as_deref())
    }

    /// Get the request concurrency bound, if configured.
    pub fn max_concurrent_requests(&self) -> Option<usize> {
        self.pick(|c| c.max_concurrent_requests)
    }

    /// Get the output path.
    ///
    /// Defaults to `CHANGELOG.md` if not configured.
    pub fn output(&self) -> PathBuf {
        self.pick(|c| c.output.clone())
            .unwrap_or_else(|| PathBuf::from("CHANGELOG.md"))
    }

    /// Get the base changelog path, if configured.
    pub fn base(&self) -> Option<&Path> {
        self.pick(|c| c.base.as_deref())
    }

    pub fn header(&self) -> Option<&str> {
        self.pick(|c| c.header.as_deref())
    }

    pub fn frontmatter(&self) -> Option<&str> {
        self.pick(|c| c.frontmatter.as_deref())
    }

    pub fn date_format(&self) -> Option<&str> {
        self.pick(|c| c.date_format.as_deref())
    }

    pub fn unreleased_label(&self) -> Option<&str> {
        self.pick(|c| c.unreleased_label.as_deref())
    }

    pub fn release_url(&self) -> Option<&str> {
        self.pick(|c| c.release_url.as_deref())
    }

    pub fn release_branch(&self) -> Option<&str> {
        self.pick(|c| c.release_branch.as_deref())
    }

    pub fn issue_prefix(&self) -> Option<&str> {
        self.pick(|c| c.issue_prefix.as_deref())
    }

    pub fn merge_prefix(&self) -> Option<&str> {
        self.pick(|c| c.merge_prefix.as_deref())
    }

    pub fn include_labels(&self) -> Option<&[String]> {
        self.pick(|c| c.include_labels.as_deref())
    }

    pub fn exclude_labels(&self) -> Option<&[String]> {
        self.pick(|c| c.exclude_labels.as_deref())
    }

    pub fn exclude_tags(&self) -> Option<&[String]> {
        self.pick(|c| c.exclude_tags.as_deref())
    }

    pub fn exclude_tags_regex(&self) -> Option<&str> {
        self.pick(|c| c.exclude_tags_regex.as_deref())
    }

    pub fn since_tag(&self) -> Option<&str> {
        self.pick(|c| c.since_tag.as_deref())
    }

    /// Get the configured sections, if any replace the built-in ones.
    pub fn sections(&self) -> Option<&[SectionConfig]> {
        self.pick(|c| c.sections.as_deref())
    }

    /// Credit pull request authors. Defaults to `true`.
    pub fn author(&self) -> bool {
        self.pick(|c| c.author).unwrap_or(true)
    }

    /// Credit authors as `@login`. Defaults to `false`.
    pub fn author_link_as_tag(&self) -> bool {
        self.pick(|c| c.author_link_as_tag).unwrap_or(false)
    }

    /// Add compare links. Defaults to `true`.
    pub fn compare_link(&self) -> bool {
        self.pick(|c| c.compare_link).unwrap_or(true)
    }

    /// Add the unreleased window. Defaults to `true`.
    pub fn unreleased(&self) -> bool {
        self.pick(|c| c.unreleased).unwrap_or(true)
    }

    /// Date on the unreleased window. Defaults to `false`.
    pub fn unreleased_with_date(&self) -> bool {
        self.pick(|c| c.unreleased_with_date).unwrap_or(false)
    }

    /// Milestone override. Defaults to `true`.
    pub fn filter_by_milestone(&self) -> bool {
        self.pick(|c| c.filter_by_milestone).unwrap_or(true)
    }

    /// Flat item lists. Defaults to `false`.
    pub fn simple_list(&self) -> bool {
        self.pick(|c| c.simple_list).unwrap_or(false)
    }

    /// Keep unlabeled issues. Defaults to `true`.
    pub fn add_issues_wo_labels(&self) -> bool {
        self.pick(|c| c.add_issues_wo_labels).unwrap_or(true)
    }

    /// Keep unlabeled pull requests. Defaults to `true`.
    pub fn add_pr_wo_labels(&self) -> bool {
        self.pick(|c| c.add_pr_wo_labels).unwrap_or(true)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
