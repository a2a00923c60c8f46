use miette::Diagnostic;
use starsync_utils::error::{PathError, UtilsError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(starsync_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(starsync_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(starsync_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Invalid parallel limit: {0}")]
    #[diagnostic(
        code(starsync_config::parallel_limit),
        help("At least one concurrent git invocation is required")
    )]
    InvalidParallelLimit(u32),

    #[error("Invalid page size: {0}")]
    #[diagnostic(
        code(starsync_config::per_page),
        help("The GitHub API accepts page sizes between 1 and 100")
    )]
    InvalidPerPage(u8),

    #[error("Invalid duration: {0}")]
    #[diagnostic(
        code(starsync_config::duration),
        help("Use a duration like `60s`, `1m30s` or `2h`")
    )]
    InvalidDuration(String),

    #[error("Rate limit wait must be greater than zero, got '{0}'")]
    #[diagnostic(
        code(starsync_config::rate_limit_wait),
        help("A zero wait retries a rate-limited page without pause; use something like `60s`")
    )]
    ZeroRateLimitWait(String),

    #[error("Invalid API URL: {0}")]
    #[diagnostic(
        code(starsync_config::api_url),
        help("Use an http(s) URL such as https://api.github.com")
    )]
    InvalidApiUrl(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(starsync_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(starsync_config::utils))]
    Utils(#[from] UtilsError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(starsync_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(starsync_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
