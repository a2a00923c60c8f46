use std::time::Duration;

use crate::OperationId;

/// All event types emitted while mirroring.
#[derive(Debug, Clone)]
pub enum MirrorEvent {
    /// A page of starred repositories was fetched.
    ListingPage { page: u32, count: usize },
    /// The API rate limit was hit; the same page is retried after `wait`.
    RateLimited { page: u32, wait: Duration },
    /// Listing finished.
    ListingComplete { total: usize },
    /// A clone or pull is starting.
    TaskStarted {
        op_id: OperationId,
        full_name: String,
        action: TaskAction,
    },
    /// A clone or pull finished, successfully or not.
    TaskFinished {
        op_id: OperationId,
        full_name: String,
        outcome: TaskStatus,
    },
    /// Overall progress of the batch.
    BatchProgress {
        completed: u32,
        total: u32,
        failed: u32,
    },
}

/// What a task does with its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Target directory is missing; the repository is cloned.
    Clone,
    /// Target directory exists; the repository is pulled.
    Pull,
}

impl TaskAction {
    pub fn verb(&self) -> &'static str {
        match self {
            TaskAction::Clone => "cloning",
            TaskAction::Pull => "pulling",
        }
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Cloned { elapsed: Duration },
    Pulled { elapsed: Duration },
    UpToDate,
    Failed { error: String },
}

impl TaskStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed { .. })
    }
}
