use std::{
    fs,
    path::PathBuf,
    sync::{LazyLock, RwLock},
    time::Duration,
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use starsync_utils::{
    path::{resolve_path, xdg_config_home},
    time::parse_duration,
};
use toml_edit::DocumentMut;
use tracing::info;

use crate::{
    annotations::annotate_toml_table,
    display::DisplaySettings,
    error::{ConfigError, Result},
};

pub const DEFAULT_DIR_FORMAT: &str = "{repo_name} [{repo_author}]";
pub const DEFAULT_OUTPUT_DIR: &str = "./";
pub const DEFAULT_PARALLEL_LIMIT: u32 = 16;
pub const DEFAULT_GIT_BINARY: &str = "git";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u8 = 100;
pub const DEFAULT_RATE_LIMIT_WAIT: &str = "60s";

/// Application's configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// GitHub personal access token (scopes: repo & user).
    /// Prefer the GH_PAT environment variable over storing it here.
    pub token: Option<String>,

    /// Mirror the stars of this user instead of the authenticated user.
    pub user: Option<String>,

    /// Directory where starred repositories are mirrored.
    /// Default: ./
    pub output_dir: Option<String>,

    /// Template for each repository's directory name.
    /// Placeholders: {repo_name}, {repo_author}, {full_name}
    /// Default: "{repo_name} [{repo_author}]"
    pub dir_format: Option<String>,

    /// Maximum number of concurrent git clone/pull invocations.
    /// Default: 16
    pub parallel_limit: Option<u32>,

    /// Extra arguments passed to `git clone`, separated by whitespace.
    pub clone_args: Option<String>,

    /// Extra arguments passed to `git pull`, separated by whitespace.
    pub pull_args: Option<String>,

    /// Git executable to invoke.
    /// Default: git
    pub git_binary: Option<String>,

    /// Base URL of the GitHub REST API.
    /// Default: https://api.github.com
    pub api_url: Option<String>,

    /// Number of starred repositories requested per page (1-100).
    /// Default: 100
    pub per_page: Option<u8>,

    /// How long to sleep before retrying a rate-limited request.
    /// Default: 60s
    pub rate_limit_wait: Option<String>,

    /// Glob patterns matched against `owner/name`; only matching repositories are mirrored.
    pub include: Option<Vec<String>>,

    /// Glob patterns matched against `owner/name`; matching repositories are skipped.
    pub exclude: Option<Vec<String>>,

    /// Terminal output settings.
    pub display: Option<DisplaySettings>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("STARSYNC_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("starsync").join("config.toml"),
    })
});

pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

pub fn get_config() -> Config {
    {
        let config_guard = CONFIG.read().unwrap();
        if let Some(config) = config_guard.as_ref() {
            return config.clone();
        }
    }

    let mut config_guard = CONFIG.write().unwrap();
    config_guard.get_or_insert_with(Config::default_config).clone()
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            token: None,
            user: None,
            output_dir: Some(DEFAULT_OUTPUT_DIR.to_string()),
            dir_format: Some(DEFAULT_DIR_FORMAT.to_string()),
            parallel_limit: Some(DEFAULT_PARALLEL_LIMIT),
            clone_args: None,
            pull_args: None,
            git_binary: Some(DEFAULT_GIT_BINARY.to_string()),
            api_url: Some(DEFAULT_API_URL.to_string()),
            per_page: Some(DEFAULT_PER_PAGE),
            rate_limit_wait: Some(DEFAULT_RATE_LIMIT_WAIT.to_string()),
            include: None,
            exclude: None,
            display: Some(DisplaySettings {
                progress: Some(true),
                icons: Some(true),
                spinners: Some(true),
            }),
        }
    }

    /// Loads the configuration file, falling back to defaults when it does
    /// not exist.
    pub fn new() -> Result<Self> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();

        let mut config = match fs::read_to_string(&config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default_config(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.apply_env_overrides();
        config.resolve()?;

        Ok(config)
    }

    /// Fills unset fields with defaults and validates the result.
    pub fn resolve(&mut self) -> Result<()> {
        self.output_dir
            .get_or_insert_with(|| DEFAULT_OUTPUT_DIR.to_string());
        self.dir_format
            .get_or_insert_with(|| DEFAULT_DIR_FORMAT.to_string());
        self.git_binary
            .get_or_insert_with(|| DEFAULT_GIT_BINARY.to_string());
        self.api_url.get_or_insert_with(|| DEFAULT_API_URL.to_string());
        self.rate_limit_wait
            .get_or_insert_with(|| DEFAULT_RATE_LIMIT_WAIT.to_string());

        let parallel_limit = *self.parallel_limit.get_or_insert(DEFAULT_PARALLEL_LIMIT);
        if parallel_limit == 0 {
            return Err(ConfigError::InvalidParallelLimit(parallel_limit));
        }

        let per_page = *self.per_page.get_or_insert(DEFAULT_PER_PAGE);
        if !(1..=100).contains(&per_page) {
            return Err(ConfigError::InvalidPerPage(per_page));
        }

        if self.get_rate_limit_wait()?.is_zero() {
            return Err(ConfigError::ZeroRateLimitWait(
                self.rate_limit_wait.clone().unwrap_or_default(),
            ));
        }

        let api_url = self.get_api_url();
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(ConfigError::InvalidApiUrl(api_url.to_string()));
        }
        self.api_url = Some(api_url.trim_end_matches('/').to_string());

        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.token = None;
        }

        Ok(())
    }

    /// Applies `STARSYNC_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(output_dir) = std::env::var("STARSYNC_OUTPUT_DIR") {
            self.output_dir = Some(output_dir);
        }
    }

    pub fn get_output_dir(&self) -> Result<PathBuf> {
        let output_dir = self.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR);
        Ok(resolve_path(output_dir)?)
    }

    pub fn get_rate_limit_wait(&self) -> Result<Duration> {
        let value = self
            .rate_limit_wait
            .as_deref()
            .unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
        parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration(value.to_string()))
    }

    pub fn get_dir_format(&self) -> &str {
        self.dir_format.as_deref().unwrap_or(DEFAULT_DIR_FORMAT)
    }

    pub fn get_parallel_limit(&self) -> u32 {
        self.parallel_limit.unwrap_or(DEFAULT_PARALLEL_LIMIT)
    }

    pub fn get_git_binary(&self) -> &str {
        self.git_binary.as_deref().unwrap_or(DEFAULT_GIT_BINARY)
    }

    pub fn get_api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn get_per_page(&self) -> u8 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }

    pub fn display(&self) -> DisplaySettings {
        self.display.clone().unwrap_or_default()
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(display_table) = doc.get_mut("display").and_then(|d| d.as_table_mut()) {
            annotate_toml_table::<DisplaySettings>(display_table, false)?;
        }

        Ok(doc)
    }
}

pub fn generate_default_config() -> Result<()> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(())
}
