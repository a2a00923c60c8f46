use std::{
    ffi::OsString,
    future::Future,
    io,
    path::Path,
    process::{Output, Stdio},
};

use starsync_config::config::Config;
use starsync_utils::string::redact;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::{
    error::{MirrorError, MirrorResult},
    types::GitOutcome,
};

const UP_TO_DATE_MESSAGES: [&str; 2] = ["Already up to date.", "Already up-to-date."];

/// Splits a whitespace separated argument string.
///
/// # Examples
///
/// ```
/// use starsync_operations::git::split_args;
///
/// assert_eq!(split_args("  --depth 1 --single-branch "), ["--depth", "1", "--single-branch"]);
/// assert!(split_args("").is_empty());
/// ```
pub fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(String::from).collect()
}

/// Embeds `token` as the user part of an `https://` clone URL.
///
/// Non-https URLs are returned unchanged.
///
/// # Examples
///
/// ```
/// use starsync_operations::git::authenticated_clone_url;
///
/// assert_eq!(
///     authenticated_clone_url("https://github.com/octocat/Hello-World.git", "ghp_x"),
///     "https://ghp_x@github.com/octocat/Hello-World.git"
/// );
/// ```
pub fn authenticated_clone_url(clone_url: &str, token: &str) -> String {
    if token.is_empty() {
        return clone_url.to_string();
    }
    clone_url.replacen("https://", &format!("https://{token}@"), 1)
}

/// Whether `git pull` output means nothing changed.
pub fn is_up_to_date(stdout: &str) -> bool {
    let stdout = stdout.trim();
    UP_TO_DATE_MESSAGES.contains(&stdout)
}

/// The version control operations the mirror needs.
pub trait VcsBackend: Send + Sync + 'static {
    /// Clones `url` into `dir`, which does not exist yet.
    fn clone_repo(
        &self,
        url: &str,
        dir: &Path,
    ) -> impl Future<Output = MirrorResult<GitOutcome>> + Send;

    /// Pulls the repository already checked out in `dir`.
    fn pull_repo(&self, dir: &Path) -> impl Future<Output = MirrorResult<GitOutcome>> + Send;
}

/// Runs the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
    clone_args: Vec<String>,
    pull_args: Vec<String>,
    secret: Option<String>,
}

impl GitCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            clone_args: Vec::new(),
            pull_args: Vec::new(),
            secret: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.get_git_binary())
            .with_clone_args(split_args(config.clone_args.as_deref().unwrap_or_default()))
            .with_pull_args(split_args(config.pull_args.as_deref().unwrap_or_default()))
            .with_secret(config.token.clone())
    }

    pub fn with_clone_args(mut self, args: Vec<String>) -> Self {
        self.clone_args = args;
        self
    }

    pub fn with_pull_args(mut self, args: Vec<String>) -> Self {
        self.pull_args = args;
        self
    }

    /// Value scrubbed from any git output that ends up in an error.
    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// `clone [clone_args...] <url> <dir>`
    pub fn clone_command_args(&self, url: &str, dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(self.clone_args.len() + 3);
        args.push("clone".into());
        args.extend(self.clone_args.iter().map(OsString::from));
        args.push(url.into());
        args.push(dir.into());
        args
    }

    /// `-C <dir> pull [pull_args...]`
    pub fn pull_command_args(&self, dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(self.pull_args.len() + 3);
        args.push("-C".into());
        args.push(dir.into());
        args.push("pull".into());
        args.extend(self.pull_args.iter().map(OsString::from));
        args
    }

    /// Runs `git --version`, returning its output.
    ///
    /// # Errors
    ///
    /// [`MirrorError::GitNotFound`] if the executable cannot be started.
    pub async fn check_available(&self) -> MirrorResult<String> {
        let output = self.run("--version", vec!["--version".into()]).await?;
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(binary = self.binary, version, "found git");
        Ok(version)
    }

    async fn run(&self, action: &'static str, args: Vec<OsString>) -> MirrorResult<Output> {
        trace!(binary = self.binary, action, "spawning git");

        let output = Command::new(&self.binary)
            .args(&args)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                if err.kind() == io::ErrorKind::NotFound {
                    MirrorError::GitNotFound {
                        binary: self.binary.clone(),
                        source: err,
                    }
                } else {
                    MirrorError::IoError {
                        action: format!("running {} {action}", self.binary),
                        source: err,
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MirrorError::GitFailed {
                action,
                status: output.status.to_string(),
                stderr: self.scrub(stderr.trim()),
            });
        }

        Ok(output)
    }

    fn scrub(&self, text: &str) -> String {
        match &self.secret {
            Some(secret) => redact(text, secret),
            None => text.to_string(),
        }
    }
}

impl VcsBackend for GitCli {
    async fn clone_repo(&self, url: &str, dir: &Path) -> MirrorResult<GitOutcome> {
        self.run("clone", self.clone_command_args(url, dir)).await?;
        Ok(GitOutcome::Cloned)
    }

    async fn pull_repo(&self, dir: &Path) -> MirrorResult<GitOutcome> {
        let output = self.run("pull", self.pull_command_args(dir)).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if is_up_to_date(&stdout) {
            Ok(GitOutcome::UpToDate)
        } else {
            Ok(GitOutcome::Pulled)
        }
    }
}
