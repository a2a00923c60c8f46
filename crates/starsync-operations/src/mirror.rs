use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};

use starsync_events::{MirrorEvent, TaskStatus};
use starsync_github::{PageSource, StarredRepository};
use starsync_utils::{fs::ensure_dir_exists, time::format_elapsed};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::{
    error::{MirrorError, MirrorResult},
    filter::RepoFilter,
    git::{authenticated_clone_url, VcsBackend},
    layout::{target_dir, DirTemplate},
    list::fetch_starred,
    progress::next_op_id,
    CompletedInfo, FailedInfo, GitOutcome, MirrorContext, MirrorPlan, MirrorReport, MirrorTask,
    SkipReason, SkippedInfo, TaskAction,
};

/// Turns a starred listing into clone and pull tasks.
///
/// Repositories rejected by `filter`, with a name that cannot be rendered, or
/// rendering to a directory already claimed by an earlier repository are
/// recorded as skipped. A task pulls when its directory exists and clones
/// otherwise.
pub fn plan(
    repos: &[StarredRepository],
    template: &DirTemplate,
    output_dir: &Path,
    filter: &RepoFilter,
    token: Option<&str>,
) -> MirrorPlan {
    let mut result = MirrorPlan::default();
    let mut claimed: HashMap<PathBuf, &str> = HashMap::new();

    for repo in repos {
        let full_name = repo.full_name.as_str();

        if !filter.matches(full_name) {
            debug!(full_name, "filtered out");
            result.skipped.push(SkippedInfo {
                full_name: full_name.to_string(),
                reason: SkipReason::Filtered,
            });
            continue;
        }

        let rendered = match template.render_full_name(full_name) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!("skipping {}: {}", full_name, err);
                result.skipped.push(SkippedInfo {
                    full_name: full_name.to_string(),
                    reason: SkipReason::InvalidName(err.to_string()),
                });
                continue;
            }
        };

        let dir = target_dir(output_dir, &rendered);

        if let Some(kept) = claimed.get(&dir) {
            warn!(
                "skipping {}: {} is already used by {}",
                full_name,
                dir.display(),
                kept
            );
            result.skipped.push(SkippedInfo {
                full_name: full_name.to_string(),
                reason: SkipReason::DuplicateDir {
                    dir,
                    kept: kept.to_string(),
                },
            });
            continue;
        }
        claimed.insert(dir.clone(), full_name);

        let action = if dir.exists() {
            TaskAction::Pull
        } else {
            TaskAction::Clone
        };

        let clone_url = match token {
            Some(token) => authenticated_clone_url(&repo.clone_url, token),
            None => repo.clone_url.clone(),
        };

        result.tasks.push(MirrorTask {
            full_name: full_name.to_string(),
            clone_url,
            dir,
            action,
        });
    }

    result
}

/// Creates the output directory, and its parents, if missing.
pub fn ensure_output_dir(path: &Path) -> MirrorResult<()> {
    ensure_dir_exists(path)?;
    Ok(())
}

/// Lists starred repositories and plans what to do with each.
///
/// The directory format is validated before any request is made.
pub async fn prepare_plan<S>(
    ctx: &MirrorContext,
    source: S,
    filter: &RepoFilter,
) -> MirrorResult<MirrorPlan>
where
    S: PageSource<Item = StarredRepository> + Send + 'static,
{
    let config = ctx.config();
    let template = DirTemplate::parse(config.get_dir_format())?;
    let output_dir = config.get_output_dir()?;

    let repos = fetch_starred(ctx, source).await?;
    let plan = plan(
        &repos,
        &template,
        &output_dir,
        filter,
        config.token.as_deref(),
    );

    debug!(
        tasks = plan.tasks.len(),
        skipped = plan.skipped.len(),
        "planned mirror"
    );
    Ok(plan)
}

/// Logs what a mirror run would do without invoking git.
pub fn dry_run(plan: &MirrorPlan) {
    for task in &plan.tasks {
        match task.action {
            TaskAction::Clone => {
                info!(
                    "would clone {} into {:?}",
                    task.full_name,
                    task.dir.display()
                )
            }
            TaskAction::Pull => {
                info!(
                    "would pull {} in {:?}",
                    task.full_name,
                    task.dir.display()
                )
            }
        }
    }
}

/// Runs every task with at most `limit` git invocations in flight.
///
/// A failing task is recorded in the report and never stops the others.
pub async fn run_mirror<B: VcsBackend>(
    ctx: &MirrorContext,
    backend: Arc<B>,
    tasks: Vec<MirrorTask>,
    limit: usize,
) -> MirrorResult<MirrorReport> {
    debug!(count = tasks.len(), limit, "mirroring repositories");
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let report = Arc::new(Mutex::new(MirrorReport::default()));

    let total = tasks.len() as u32;
    let completed = Arc::new(AtomicU32::new(0));
    let failed_count = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::with_capacity(tasks.len());

    for task in tasks {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| MirrorError::Custom(format!("Semaphore closed: {err}")))?;
        let events = ctx.events().clone();
        let backend = backend.clone();
        let report = report.clone();
        let completed = completed.clone();
        let failed_count = failed_count.clone();

        let handle = tokio::spawn(async move {
            let op_id = next_op_id();
            events.emit(MirrorEvent::TaskStarted {
                op_id,
                full_name: task.full_name.clone(),
                action: task.action,
            });

            let start = Instant::now();
            let result = match task.action {
                TaskAction::Clone => backend.clone_repo(&task.clone_url, &task.dir).await,
                TaskAction::Pull => backend.pull_repo(&task.dir).await,
            };
            let elapsed = start.elapsed();

            let entry = CompletedInfo {
                full_name: task.full_name.clone(),
                dir: task.dir.clone(),
                elapsed,
            };

            let status = match result {
                Ok(GitOutcome::Cloned) => {
                    info!(
                        "cloned {} into {:?}, took {}",
                        task.full_name,
                        task.dir.display(),
                        format_elapsed(elapsed)
                    );
                    report.lock().unwrap().cloned.push(entry);
                    TaskStatus::Cloned {
                        elapsed,
                    }
                }
                Ok(GitOutcome::Pulled) => {
                    info!(
                        "pulled {} into {:?}, took {}",
                        task.full_name,
                        task.dir.display(),
                        format_elapsed(elapsed)
                    );
                    report.lock().unwrap().pulled.push(entry);
                    TaskStatus::Pulled {
                        elapsed,
                    }
                }
                Ok(GitOutcome::UpToDate) => {
                    info!("{} is up to date", task.full_name);
                    report.lock().unwrap().up_to_date.push(entry);
                    TaskStatus::UpToDate
                }
                Err(err) => {
                    error!(
                        "error when {} {}: {}",
                        task.action.verb(),
                        task.full_name,
                        err
                    );
                    failed_count.fetch_add(1, Ordering::Relaxed);
                    report.lock().unwrap().failed.push(FailedInfo {
                        full_name: task.full_name.clone(),
                        dir: task.dir.clone(),
                        action: task.action,
                        error: err.to_string(),
                    });
                    TaskStatus::Failed {
                        error: err.to_string(),
                    }
                }
            };

            events.emit(MirrorEvent::TaskFinished {
                op_id,
                full_name: task.full_name,
                outcome: status,
            });

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            events.emit(MirrorEvent::BatchProgress {
                completed: done,
                total,
                failed: failed_count.load(Ordering::Relaxed),
            });

            drop(permit);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle
            .await
            .map_err(|err| MirrorError::Custom(format!("Join handle error: {err}")))?;
    }

    let report = Arc::into_inner(report)
        .ok_or_else(|| MirrorError::Custom("Mirror report is still shared".into()))?
        .into_inner()
        .map_err(|_| MirrorError::Custom("Mirror report lock poisoned".into()))?;

    Ok(report)
}

/// Lists, plans and mirrors every starred repository.
pub async fn mirror_stars<S, B>(
    ctx: &MirrorContext,
    source: S,
    backend: Arc<B>,
    filter: &RepoFilter,
) -> MirrorResult<MirrorReport>
where
    S: PageSource<Item = StarredRepository> + Send + 'static,
    B: VcsBackend,
{
    let plan = prepare_plan(ctx, source, filter).await?;
    ensure_output_dir(&ctx.config().get_output_dir()?)?;

    let limit = ctx.config().get_parallel_limit() as usize;
    let mut report = run_mirror(ctx, backend, plan.tasks, limit).await?;
    report.skipped = plan.skipped;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::atomic::AtomicUsize,
        time::Duration,
    };

    use starsync_config::config::Config;
    use starsync_events::{CollectorSink, EventSinkHandle};
    use tempfile::tempdir;

    use starsync_github::GithubError;

    use super::*;
    use crate::test_utils::{page, repo, ScriptedSource};

    fn task(full_name: &str, dir: &str, action: TaskAction) -> MirrorTask {
        MirrorTask {
            full_name: full_name.to_string(),
            clone_url: format!("https://github.com/{full_name}.git"),
            dir: PathBuf::from(dir),
            action,
        }
    }

    /// Records calls and tracks how many run at once.
    #[derive(Default)]
    struct FakeBackend {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        clones: Mutex<Vec<String>>,
        pulls: Mutex<Vec<PathBuf>>,
    }

    impl FakeBackend {
        async fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl VcsBackend for FakeBackend {
        async fn clone_repo(&self, url: &str, dir: &Path) -> MirrorResult<GitOutcome> {
            self.enter().await;
            self.clones.lock().unwrap().push(url.to_string());
            if dir.to_string_lossy().contains("broken") {
                return Err(MirrorError::GitFailed {
                    action: "clone",
                    status: "exit status: 128".into(),
                    stderr: "fatal: repository not found".into(),
                });
            }
            Ok(GitOutcome::Cloned)
        }

        async fn pull_repo(&self, dir: &Path) -> MirrorResult<GitOutcome> {
            self.enter().await;
            self.pulls.lock().unwrap().push(dir.to_path_buf());
            if dir.to_string_lossy().contains("stale") {
                Ok(GitOutcome::Pulled)
            } else {
                Ok(GitOutcome::UpToDate)
            }
        }
    }

    fn context() -> (MirrorContext, Arc<CollectorSink>) {
        let collector = Arc::new(CollectorSink::default());
        let events: EventSinkHandle = collector.clone();
        (
            MirrorContext::new(Config::default_config(), events),
            collector,
        )
    }

    #[test]
    fn test_plan_clone_or_pull() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("tokio [tokio-rs]")).unwrap();

        let template = DirTemplate::parse("{repo_name} [{repo_author}]").unwrap();
        let plan = plan(
            &[repo("tokio-rs/tokio"), repo("serde-rs/serde")],
            &template,
            tmp.path(),
            &RepoFilter::default(),
            Some("tok"),
        );

        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].action, TaskAction::Pull);
        assert_eq!(plan.tasks[1].action, TaskAction::Clone);
        assert_eq!(
            plan.tasks[1].clone_url,
            "https://tok@github.com/serde-rs/serde.git"
        );
        assert_eq!(plan.count(TaskAction::Clone), 1);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_plan_skips_filtered_invalid_and_duplicates() {
        let template = DirTemplate::parse("{repo_name}").unwrap();
        let filter = RepoFilter {
            exclude: vec!["*/awesome-*".into()],
            ..Default::default()
        };
        let plan = plan(
            &[
                repo("alice/tools"),
                repo("bob/tools"),
                repo("carol/awesome-rust"),
                repo("nameless"),
            ],
            &template,
            Path::new("/nonexistent/stars"),
            &filter,
            None,
        );

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].full_name, "alice/tools");
        assert_eq!(
            plan.tasks[0].clone_url,
            "https://github.com/alice/tools.git"
        );

        assert_eq!(plan.skipped.len(), 3);
        assert_eq!(plan.skipped[0].full_name, "bob/tools");
        assert_eq!(plan.skipped[0].reason, SkipReason::DuplicateDir {
            dir: PathBuf::from("/nonexistent/stars/tools"),
            kept: "alice/tools".into(),
        });
        assert_eq!(plan.skipped[1].reason, SkipReason::Filtered);
        assert!(matches!(
            plan.skipped[2].reason,
            SkipReason::InvalidName(_)
        ));
    }

    #[test]
    fn test_ensure_output_dir() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());

        let file = tmp.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(ensure_output_dir(&file).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_mirror_respects_limit() {
        let (ctx, _) = context();
        let backend = Arc::new(FakeBackend::default());
        let tasks = (0..12)
            .map(|i| {
                task(
                    &format!("owner/repo{i}"),
                    &format!("/srv/repo{i}"),
                    TaskAction::Clone,
                )
            })
            .collect();

        let report = run_mirror(&ctx, backend.clone(), tasks, 3).await.unwrap();

        assert_eq!(report.cloned.len(), 12);
        let max = backend.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "{max} tasks ran at once");
        assert!(max >= 2);
    }

    #[tokio::test]
    async fn test_run_mirror_collects_outcomes() {
        let (ctx, collector) = context();
        let backend = Arc::new(FakeBackend::default());
        let tasks = vec![
            task("a/new", "/srv/new", TaskAction::Clone),
            task("a/broken", "/srv/broken", TaskAction::Clone),
            task("a/stale", "/srv/stale", TaskAction::Pull),
            task("a/fresh", "/srv/fresh", TaskAction::Pull),
        ];

        let report = run_mirror(&ctx, backend.clone(), tasks, 2).await.unwrap();

        assert_eq!(report.cloned.len(), 1);
        assert_eq!(report.pulled.len(), 1);
        assert_eq!(report.up_to_date.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].full_name, "a/broken");
        assert_eq!(report.failed[0].action, TaskAction::Clone);
        assert_eq!(report.total(), 4);

        assert_eq!(backend.clones.lock().unwrap().len(), 2);
        assert_eq!(backend.pulls.lock().unwrap().len(), 2);

        let events = collector.events();
        let finished = events
            .iter()
            .filter(|e| matches!(e, MirrorEvent::TaskFinished { .. }))
            .count();
        assert_eq!(finished, 4);
        assert!(events.iter().any(|e| {
            matches!(
                e,
                MirrorEvent::BatchProgress {
                    completed: 4,
                    total: 4,
                    failed: 1
                }
            )
        }));
    }

    #[tokio::test]
    async fn test_run_mirror_empty() {
        let (ctx, collector) = context();
        let report = run_mirror(&ctx, Arc::new(FakeBackend::default()), Vec::new(), 16)
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(collector.is_empty());
    }

    fn sync_context(output_dir: &Path, dir_format: &str) -> MirrorContext {
        let mut config = Config {
            token: Some("tok".into()),
            output_dir: Some(output_dir.to_string_lossy().into_owned()),
            dir_format: Some(dir_format.into()),
            parallel_limit: Some(2),
            ..Config::default_config()
        };
        config.resolve().unwrap();
        MirrorContext::new(config, Arc::new(CollectorSink::default()))
    }

    #[tokio::test]
    async fn test_mirror_stars_reports_skipped() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("stars");
        fs::create_dir_all(out.join("known")).unwrap();
        let ctx = sync_context(&out, "{repo_name}");

        let source = ScriptedSource::new(vec![
            page(
                &["alice/known", "bob/awesome-list"],
                Some("https://api.github.com/user/starred?page=2"),
            ),
            page(&["carol/fresh", "nameless", "dave/known"], None),
        ]);
        let filter = RepoFilter {
            exclude: vec!["*/awesome-*".into()],
            ..Default::default()
        };
        let backend = Arc::new(FakeBackend::default());

        let report = mirror_stars(&ctx, source, backend.clone(), &filter)
            .await
            .unwrap();

        assert_eq!(report.up_to_date.len(), 1);
        assert_eq!(report.up_to_date[0].full_name, "alice/known");
        assert_eq!(report.cloned.len(), 1);
        assert_eq!(report.cloned[0].dir, out.join("fresh"));
        assert_eq!(
            *backend.clones.lock().unwrap(),
            ["https://tok@github.com/carol/fresh.git"]
        );

        let skipped: Vec<_> = report
            .skipped
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert_eq!(skipped, ["bob/awesome-list", "nameless", "dave/known"]);
        assert_eq!(report.skipped[0].reason, SkipReason::Filtered);
        assert!(matches!(
            report.skipped[2].reason,
            SkipReason::DuplicateDir { ref kept, .. } if kept == "alice/known"
        ));
    }

    #[tokio::test]
    async fn test_mirror_stars_creates_output_dir() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("a/b");
        let ctx = sync_context(&out, "{full_name}");

        let source = ScriptedSource::new(vec![page(&["tokio-rs/tokio"], None)]);
        let report = mirror_stars(
            &ctx,
            source,
            Arc::new(FakeBackend::default()),
            &RepoFilter::default(),
        )
        .await
        .unwrap();

        assert!(out.is_dir());
        assert_eq!(report.cloned[0].dir, out.join("tokio-rs/tokio"));
    }

    #[tokio::test]
    async fn test_bad_format_fails_before_listing() {
        let tmp = tempdir().unwrap();
        let ctx = sync_context(tmp.path(), "{repo}");

        let source = ScriptedSource::new(vec![page(&["a/b"], None)]);
        let requests = source.requests();
        let backend = Arc::new(FakeBackend::default());

        let result = mirror_stars(&ctx, source, backend.clone(), &RepoFilter::default()).await;

        assert!(matches!(result, Err(MirrorError::UnknownPlaceholder { .. })));
        assert!(requests.lock().unwrap().is_empty());
        assert!(backend.clones.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_page_error_aborts() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("stars");
        let ctx = sync_context(&out, "{repo_name}");

        let source = ScriptedSource::new(vec![Err(GithubError::Unauthorized {
            url: "https://api.github.com/user/starred".into(),
        })]);
        let backend = Arc::new(FakeBackend::default());

        let result = mirror_stars(&ctx, source, backend.clone(), &RepoFilter::default()).await;

        assert!(matches!(
            result,
            Err(MirrorError::Github(GithubError::Unauthorized { .. }))
        ));
        assert!(backend.clones.lock().unwrap().is_empty());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_later_page_error_keeps_partial_listing() {
        let tmp = tempdir().unwrap();
        let ctx = sync_context(tmp.path(), "{repo_name}");

        let source = ScriptedSource::new(vec![
            page(&["a/one"], Some("https://api.github.com/user/starred?page=2")),
            Err(GithubError::HttpError {
                status: 502,
                url: "https://api.github.com/user/starred?page=2".into(),
            }),
        ]);

        let plan = prepare_plan(&ctx, source, &RepoFilter::default())
            .await
            .unwrap();

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].full_name, "a/one");
    }
}
