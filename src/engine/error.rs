//! engine::error
//!
//! Error type for a changelog generation run.

use thiserror::Error;

use crate::core::types::MalformedDateError;
use crate::forge::ForgeError;

/// Errors that abort a generation run.
///
/// Recoverable conditions (an unknown since/due/exclude tag, an item that
/// cannot be attributed) are logged as warnings and never surface here.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A window bound was required but not set.
    #[error("missing tag: a window bound is unset")]
    MissingTag,

    /// A tag named on the command line does not exist.
    #[error("tag '{tag}' given to {option} was not found in the repository")]
    TagNotFound {
        /// The tag name as given
        tag: String,
        /// The option that named it
        option: &'static str,
    },

    /// The forge quota is exhausted.
    #[error("API rate limit exceeded; supply a token (--token or CHANGELOG_GITHUB_TOKEN) to raise the limit")]
    RateLimitExceeded,

    /// A tag's instant could not be parsed.
    #[error("cannot order tag '{tag}': {source}")]
    MalformedDate {
        /// The tag whose date is malformed
        tag: String,
        /// The underlying parse failure
        #[source]
        source: MalformedDateError,
    },

    /// The exclude-tags pattern does not compile.
    #[error("invalid exclude-tags-regex '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as configured
        pattern: String,
        /// Compiler diagnostic
        message: String,
    },

    /// Any other forge failure.
    #[error("forge error: {0}")]
    Forge(ForgeError),
}

impl From<ForgeError> for GeneratorError {
    fn from(err: ForgeError) -> Self {
        match err {
            ForgeError::RateLimited => GeneratorError::RateLimitExceeded,
            other => GeneratorError::Forge(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_distinguished() {
        let err: GeneratorError = ForgeError::RateLimited.into();
        assert!(matches!(err, GeneratorError::RateLimitExceeded));
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn other_forge_errors_wrap() {
        let err: GeneratorError = ForgeError::NotFound("repo".into()).into();
        assert!(matches!(err, GeneratorError::Forge(ForgeError::NotFound(_))));
    }

    #[test]
    fn tag_not_found_names_option() {
        let err = GeneratorError::TagNotFound {
            tag: "v9".into(),
            option: "--between-tags",
        };
        assert_eq!(
            err.to_string(),
            "tag 'v9' given to --between-tags was not found in the repository"
        );
    }
}
