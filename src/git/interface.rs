//! git::interface
//!
//! Read-only access to the local repository.
//!
//! # Design
//!
//! tagscribe never writes to the repository. It reads two things: config
//! values (for the API token) and remote URLs (for project discovery).
//! Lookups that simply find nothing return `Ok(None)`; only genuine git
//! failures are errors.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Any other libgit2 failure.
    #[error("git error: {message}")]
    Internal {
        /// The libgit2 message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Handle to a discovered repository.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("git_dir", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open the repository containing `path`.
    ///
    /// Searches upward from `path` like `git` itself does.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepo`] if no repository encloses `path`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Read a string from the repository's layered config (repo, global,
    /// system).
    pub fn config_string(&self, key: &str) -> Result<Option<String>, GitError> {
        let config = self.repo.config()?;
        read_string(&config, key)
    }

    /// Get the URL of a remote.
    ///
    /// Returns `None` if the remote doesn't exist or has no URL.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the default remote name.
    ///
    /// Prefers "origin", otherwise the first remote, or `None` if there are
    /// no remotes.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;
        let names: Vec<&str> = remotes.iter().flatten().collect();
        if names.contains(&"origin") {
            return Ok(Some("origin".to_string()));
        }
        Ok(names.first().map(|n| n.to_string()))
    }

    /// URL of remote `name`, or of the default remote when `name` is absent.
    pub fn remote_url_or_default(&self, name: &str) -> Result<Option<String>, GitError> {
        if let Some(url) = self.remote_url(name)? {
            return Ok(Some(url));
        }
        match self.default_remote()? {
            Some(fallback) => {
                tracing::debug!(missing = name, remote = %fallback, "using default remote");
                self.remote_url(&fallback)
            }
            None => Ok(None),
        }
    }
}

/// Read a string from the user's global git config, outside any repository.
pub fn global_config_string(key: &str) -> Result<Option<String>, GitError> {
    let config = git2::Config::open_default()?;
    read_string(&config, key)
}

fn read_string(config: &git2::Config, key: &str) -> Result<Option<String>, GitError> {
    match config.get_string(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
