use std::{fmt, path::PathBuf, time::Duration};

pub use starsync_events::TaskAction;

// ---- Planning ----

/// A single clone or pull to perform.
#[derive(Clone)]
pub struct MirrorTask {
    pub full_name: String,
    /// Clone URL with the token embedded, when one is configured.
    pub clone_url: String,
    pub dir: PathBuf,
    pub action: TaskAction,
}

impl fmt::Debug for MirrorTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorTask")
            .field("full_name", &self.full_name)
            .field("dir", &self.dir)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// Why a starred repository is not mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Rejected by the include/exclude patterns.
    Filtered,
    /// Name could not be rendered into a directory.
    InvalidName(String),
    /// Another repository already resolved to the same directory.
    DuplicateDir { dir: PathBuf, kept: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Filtered => write!(f, "filtered out"),
            SkipReason::InvalidName(err) => write!(f, "{err}"),
            SkipReason::DuplicateDir {
                dir,
                kept,
            } => write!(f, "{} is already used by {kept}", dir.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedInfo {
    pub full_name: String,
    pub reason: SkipReason,
}

/// Tasks produced from a starred listing.
#[derive(Debug, Default)]
pub struct MirrorPlan {
    pub tasks: Vec<MirrorTask>,
    pub skipped: Vec<SkippedInfo>,
}

impl MirrorPlan {
    pub fn count(&self, action: TaskAction) -> usize {
        self.tasks.iter().filter(|t| t.action == action).count()
    }
}

// ---- Execution ----

/// What a successful git invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOutcome {
    Cloned,
    Pulled,
    UpToDate,
}

/// A repository that was cloned or pulled.
#[derive(Debug, Clone)]
pub struct CompletedInfo {
    pub full_name: String,
    pub dir: PathBuf,
    pub elapsed: Duration,
}

/// A repository whose clone or pull failed.
#[derive(Debug, Clone)]
pub struct FailedInfo {
    pub full_name: String,
    pub dir: PathBuf,
    pub action: TaskAction,
    pub error: String,
}

/// Report returned after mirroring completes.
#[derive(Debug, Default)]
pub struct MirrorReport {
    pub cloned: Vec<CompletedInfo>,
    pub pulled: Vec<CompletedInfo>,
    pub up_to_date: Vec<CompletedInfo>,
    pub failed: Vec<FailedInfo>,
    pub skipped: Vec<SkippedInfo>,
}

impl MirrorReport {
    pub fn total(&self) -> usize {
        self.cloned.len() + self.pulled.len() + self.up_to_date.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

// ---- Listing ----

/// A starred repository and where it would be mirrored.
#[derive(Debug, Clone)]
pub struct StarEntry {
    pub full_name: String,
    pub description: Option<String>,
    pub dir: Option<PathBuf>,
    pub exists: bool,
    pub archived: bool,
    pub fork: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_debug_hides_url() {
        let task = MirrorTask {
            full_name: "octocat/Hello-World".into(),
            clone_url: "https://ghp_secret@github.com/octocat/Hello-World.git".into(),
            dir: PathBuf::from("/srv/Hello-World [octocat]"),
            action: TaskAction::Clone,
        };
        let debug = format!("{task:?}");
        assert!(debug.contains("octocat/Hello-World"));
        assert!(!debug.contains("ghp_secret"));
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::DuplicateDir {
            dir: PathBuf::from("/srv/tools [a]"),
            kept: "a/tools".into(),
        };
        assert_eq!(reason.to_string(), "/srv/tools [a] is already used by a/tools");
    }

    #[test]
    fn test_report_total() {
        let info = CompletedInfo {
            full_name: "a/b".into(),
            dir: PathBuf::from("/srv/b"),
            elapsed: Duration::from_secs(1),
        };
        let report = MirrorReport {
            cloned: vec![info.clone()],
            up_to_date: vec![info],
            ..Default::default()
        };
        assert_eq!(report.total(), 2);
        assert!(!report.has_failures());
    }
}
