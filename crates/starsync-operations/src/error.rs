//! Error types for starsync operations.

use miette::Diagnostic;
use starsync_config::error::ConfigError;
use starsync_github::GithubError;
use starsync_utils::error::{FileSystemError, PathError};
use thiserror::Error;

/// Error type for mirroring operations.
#[derive(Error, Diagnostic, Debug)]
pub enum MirrorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    #[diagnostic(code(starsync::path), help("Check the output directory path"))]
    PathError(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(starsync::fs), help("Check file permissions and disk space"))]
    FileSystemError(#[from] FileSystemError),

    #[error("Error while {action}")]
    #[diagnostic(code(starsync::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown placeholder '{{{placeholder}}}' in directory format '{template}'")]
    #[diagnostic(
        code(starsync::dir_format::unknown_placeholder),
        help("Available placeholders: {{repo_name}}, {{repo_author}}, {{full_name}}")
    )]
    UnknownPlaceholder {
        placeholder: String,
        template: String,
    },

    #[error("Unclosed placeholder in directory format '{0}'")]
    #[diagnostic(
        code(starsync::dir_format::unclosed),
        help("Close the placeholder with '}}' or write '{{{{' for a literal brace")
    )]
    UnclosedPlaceholder(String),

    #[error("Directory format '{0}' has no placeholder")]
    #[diagnostic(
        code(starsync::dir_format::no_placeholder),
        help("Every repository would share one directory; include {{repo_name}} or {{full_name}}")
    )]
    MissingPlaceholder(String),

    #[error("Invalid repository name '{0}'")]
    #[diagnostic(code(starsync::invalid_name), help("Expected the form owner/name"))]
    InvalidFullName(String),

    #[error("Directory format produced an empty name for '{0}'")]
    #[diagnostic(
        code(starsync::dir_format::empty),
        help("Make sure the directory format contains at least one placeholder or literal")
    )]
    EmptyDirName(String),

    #[error("Git executable '{binary}' not found")]
    #[diagnostic(
        code(starsync::git_not_found),
        help("Install git or point `git_binary` in the config at it")
    )]
    GitNotFound {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {action} exited with {status}: {stderr}")]
    #[diagnostic(code(starsync::git_failed))]
    GitFailed {
        action: &'static str,
        status: String,
        stderr: String,
    },

    #[error("No GitHub token provided")]
    #[diagnostic(
        code(starsync::missing_token),
        help("Pass --gh-pat, set GH_PAT, or add `token` to the config file")
    )]
    MissingToken,

    #[error("{0}")]
    #[diagnostic(code(starsync::error))]
    Custom(String),
}

pub type MirrorResult<T> = std::result::Result<T, MirrorError>;

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> MirrorResult<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> MirrorResult<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            MirrorError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_with_context() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::Other, "boom"));
        let err = result
            .with_context(|| "reading /srv/stars".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "Error while reading /srv/stars");
    }

    #[test]
    fn test_unknown_placeholder_display() {
        let err = MirrorError::UnknownPlaceholder {
            placeholder: "owner".to_string(),
            template: "{owner}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown placeholder '{owner}' in directory format '{owner}'"
        );
    }

    #[test]
    fn test_git_failed_display() {
        let err = MirrorError::GitFailed {
            action: "clone",
            status: "exit status: 128".to_string(),
            stderr: "fatal: repository not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git clone exited with exit status: 128: fatal: repository not found"
        );
    }
}
