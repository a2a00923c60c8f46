use std::{fs, sync::Arc};

use clap::Parser;
use cli::{Args, Commands, GithubArgs};
use list::list_starred;
use logging::{hide_secret, setup_logging};
use progress::{spawn_event_handler, ProgressGuard};
use starsync_config::config::{self, generate_default_config, get_config, Config, CONFIG_PATH};
use starsync_events::{ChannelSink, EventSinkHandle, NullSink};
use starsync_github::http_client::configure_http_client;
use starsync_operations::{filter::RepoFilter, MirrorContext, MirrorError, MirrorResult};
use starsync_utils::path::resolve_path;
use sync::sync_stars;
use tracing::{debug, info, warn};
use ureq::Proxy;
use utils::{parse_headers, progress_enabled, COLOR};

mod cli;
mod list;
mod logging;
mod progress;
mod sync;
mod utils;

pub fn create_context(config: Config) -> (MirrorContext, Option<ProgressGuard>) {
    if progress_enabled() {
        let (sink, receiver) = ChannelSink::new();
        let events: EventSinkHandle = Arc::new(sink);
        let ctx = MirrorContext::new(config, events);
        let guard = spawn_event_handler(receiver);
        (ctx, Some(guard))
    } else {
        let events: EventSinkHandle = Arc::new(NullSink);
        let ctx = MirrorContext::new(config, events);
        (ctx, None)
    }
}

fn apply_github_args(config: &mut Config, github: GithubArgs) {
    if let Some(token) = github.gh_pat {
        config.token = Some(token);
    }
    if let Some(user) = github.user {
        config.user = Some(user);
    }
}

fn configure_http(args: &Args) -> MirrorResult<()> {
    let proxy = args
        .proxy
        .as_deref()
        .map(Proxy::new)
        .transpose()
        .map_err(|err| MirrorError::Custom(format!("Invalid proxy: {err}")))?;
    let headers = args.header.as_deref().map(parse_headers).transpose()?;
    let user_agent = args.user_agent.clone();

    configure_http_client(|config| {
        if proxy.is_some() {
            config.proxy = proxy;
        }
        if let Some(user_agent) = user_agent {
            config.user_agent = Some(user_agent);
        }
        if headers.is_some() {
            config.headers = headers;
        }
    });

    Ok(())
}

fn print_config() -> MirrorResult<()> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();

    let content = match fs::read_to_string(&config_path) {
        Ok(v) => v,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found", config_path.display());
            Config::default_config().to_annotated_document()?.to_string()
        }
        Err(err) => {
            return Err(MirrorError::IoError {
                action: "reading config".to_string(),
                source: err,
            });
        }
    };

    info!("{}", content.trim_end());
    Ok(())
}

async fn handle_cli() -> MirrorResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    if args.no_progress {
        let mut progress = utils::PROGRESS.write().unwrap();
        *progress = false;
    }

    if let Some(ref c) = args.config {
        let path = resolve_path(c)?;
        let mut config_path = CONFIG_PATH.write().unwrap();
        *config_path = path;
    }

    configure_http(&args)?;

    match args.command {
        Commands::DefConfig => generate_default_config()?,
        Commands::Config => print_config()?,
        command => {
            config::init()?;
            let mut config = get_config();

            let (filter, dry_run) = match command {
                Commands::Sync {
                    github,
                    dir_format,
                    limit,
                    clone_args,
                    pull_args,
                    output_dir,
                    include,
                    exclude,
                    exact_case,
                    dry_run,
                } => {
                    apply_github_args(&mut config, github);
                    config.dir_format = dir_format.or(config.dir_format);
                    config.parallel_limit = limit.or(config.parallel_limit);
                    config.clone_args = clone_args.or(config.clone_args);
                    config.pull_args = pull_args.or(config.pull_args);
                    config.output_dir = output_dir.or(config.output_dir);
                    config.include = include.or(config.include);
                    config.exclude = exclude.or(config.exclude);

                    let filter = RepoFilter {
                        include: config.include.clone().unwrap_or_default(),
                        exclude: config.exclude.clone().unwrap_or_default(),
                        case_sensitive: exact_case,
                    };
                    (Some(filter), dry_run)
                }
                Commands::List {
                    github,
                } => {
                    apply_github_args(&mut config, github);
                    (None, false)
                }
                Commands::Config | Commands::DefConfig => unreachable!(),
            };

            config.resolve()?;
            hide_secret(config.token.as_deref());
            debug!(
                output_dir = ?config.get_output_dir()?,
                limit = config.get_parallel_limit(),
                "effective configuration"
            );

            let (ctx, progress_guard) = create_context(config);

            let result = match filter {
                Some(filter) => sync_stars(&ctx, filter, dry_run).await,
                None => list_starred(&ctx).await,
            };

            // The context owns the channel sender; dropping it lets the
            // progress thread drain and exit.
            drop(ctx);
            if let Some(guard) = progress_guard {
                guard.finish();
            }
            progress::stop();

            result?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_github_args_overrides_config() {
        let mut config = Config {
            token: Some("from-file".into()),
            user: Some("file-user".into()),
            ..Config::default_config()
        };

        apply_github_args(&mut config, GithubArgs {
            gh_pat: Some("from-flag".into()),
            user: None,
        });

        assert_eq!(config.token.as_deref(), Some("from-flag"));
        assert_eq!(config.user.as_deref(), Some("file-user"));
    }
}
