use std::{
    collections::HashMap,
    sync::{mpsc::Receiver, Arc, LazyLock},
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nu_ansi_term::Color::Cyan;
use starsync_config::config::get_config;
use starsync_events::{MirrorEvent, OperationId};

use crate::utils::Colored;

/// Shared MultiProgress instance for suspend/stop from other modules.
static MULTI: LazyLock<Arc<MultiProgress>> = LazyLock::new(|| Arc::new(MultiProgress::new()));

/// Pause progress display, run the closure, then resume.
pub fn suspend<F: FnOnce()>(f: F) {
    MULTI.suspend(f);
}

/// Stop and clear all progress bars.
pub fn stop() {
    MULTI.clear().ok();
}

/// Owns the background thread started by [`spawn_event_handler`].
///
/// The context holding the channel sender must be dropped before calling
/// [`finish`](ProgressGuard::finish), otherwise the thread waits forever.
pub struct ProgressGuard {
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ProgressGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn create_spinner(msg: String) -> ProgressBar {
    let pb = if get_config().display().spinners() {
        MULTI.add(ProgressBar::new_spinner())
    } else {
        MULTI.add(ProgressBar::hidden())
    };
    pb.set_style(spinner_style());
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn listing_message(page: u32, fetched: usize) -> String {
    format!("Fetching starred repositories: page {page} ({fetched} so far)")
}

fn batch_message(completed: u32, total: u32, failed: u32) -> String {
    if failed > 0 {
        format!("Progress: {completed}/{total} ({failed} failed)")
    } else {
        format!("Progress: {completed}/{total}")
    }
}

/// Spawns a thread that maps [`MirrorEvent`]s to indicatif spinners.
///
/// Each in-flight repository gets one spinner, cleared when its task
/// finishes. The batch spinner is kept below the task spinners.
pub fn spawn_event_handler(receiver: Receiver<MirrorEvent>) -> ProgressGuard {
    let handle = std::thread::spawn(move || {
        let mut jobs: HashMap<OperationId, ProgressBar> = HashMap::new();
        let mut listing_job: Option<ProgressBar> = None;
        let mut fetched = 0usize;
        let mut batch_job: Option<ProgressBar> = None;
        let mut batch_msg: Option<String> = None;

        while let Ok(event) = receiver.recv() {
            match event {
                MirrorEvent::ListingPage {
                    page,
                    count,
                } => {
                    fetched += count;
                    let msg = listing_message(page + 1, fetched);
                    let pb = listing_job.get_or_insert_with(|| create_spinner(msg.clone()));
                    pb.set_message(msg);
                }
                MirrorEvent::RateLimited {
                    page,
                    wait,
                } => {
                    let msg = format!(
                        "Rate limited on page {page}, retrying in {}s",
                        wait.as_secs()
                    );
                    let pb = listing_job.get_or_insert_with(|| create_spinner(msg.clone()));
                    pb.set_message(msg);
                }
                MirrorEvent::ListingComplete {
                    ..
                } => {
                    if let Some(pb) = listing_job.take() {
                        pb.finish_and_clear();
                    }
                }
                MirrorEvent::TaskStarted {
                    op_id,
                    full_name,
                    action,
                } => {
                    let msg = format!("{}: {}", Colored(Cyan, &full_name), action.verb());
                    jobs.insert(op_id, create_spinner(msg));

                    if let Some(old) = batch_job.take() {
                        old.finish_and_clear();
                        if let Some(ref msg) = batch_msg {
                            batch_job = Some(create_spinner(msg.clone()));
                        }
                    }
                }
                MirrorEvent::TaskFinished {
                    op_id, ..
                } => {
                    if let Some(pb) = jobs.remove(&op_id) {
                        pb.finish_and_clear();
                    }
                }
                MirrorEvent::BatchProgress {
                    completed,
                    total,
                    failed,
                } => {
                    let msg = batch_message(completed, total, failed);
                    batch_msg = Some(msg.clone());
                    let pb = batch_job.get_or_insert_with(|| create_spinner(msg.clone()));
                    pb.set_message(msg);
                }
            }
        }

        if let Some(pb) = listing_job.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = batch_job.take() {
            pb.finish_and_clear();
        }
        for (_, pb) in jobs {
            pb.finish_and_clear();
        }
    });

    ProgressGuard {
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_message() {
        assert_eq!(batch_message(3, 10, 0), "Progress: 3/10");
        assert_eq!(batch_message(10, 10, 2), "Progress: 10/10 (2 failed)");
    }

    #[test]
    fn test_listing_message() {
        assert_eq!(
            listing_message(3, 200),
            "Fetching starred repositories: page 3 (200 so far)"
        );
    }
}
