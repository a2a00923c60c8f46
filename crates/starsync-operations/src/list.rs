use starsync_config::config::Config;
use starsync_github::{collect_pages, starred_url, GithubClient, PageSource, StarredRepository};
use tracing::debug;

use crate::{
    error::{MirrorError, MirrorResult},
    layout::{target_dir, DirTemplate},
    progress::create_listing_bridge,
    MirrorContext, StarEntry,
};

/// GitHub client for the API and token in `config`.
pub fn github_client(config: &Config) -> GithubClient {
    GithubClient::new(config.get_api_url(), config.token.clone())
}

/// Fetches every starred repository of the configured user from `source`.
///
/// Without `user` in the config the token owner's stars are listed, which
/// requires a token.
pub async fn fetch_starred<S>(ctx: &MirrorContext, source: S) -> MirrorResult<Vec<StarredRepository>>
where
    S: PageSource<Item = StarredRepository> + Send + 'static,
{
    let config = ctx.config();

    if config.user.is_none() && config.token.is_none() {
        return Err(MirrorError::MissingToken);
    }

    let url = starred_url(
        config.get_api_url(),
        config.user.as_deref(),
        config.get_per_page(),
    );
    let wait = config.get_rate_limit_wait()?;
    let bridge = create_listing_bridge(ctx.events().clone());

    debug!(url, "listing starred repositories");

    let repos = tokio::task::spawn_blocking(move || collect_pages(&source, &url, wait, bridge))
        .await
        .map_err(|err| MirrorError::Custom(format!("Join handle error: {err}")))??;

    debug!(count = repos.len(), "listed starred repositories");
    Ok(repos)
}

/// Resolves where each repository would be mirrored.
pub fn describe_stars(
    repos: &[StarredRepository],
    template: &DirTemplate,
    output_dir: &std::path::Path,
) -> Vec<StarEntry> {
    repos
        .iter()
        .map(|repo| {
            let dir = template
                .render_full_name(&repo.full_name)
                .ok()
                .map(|rendered| target_dir(output_dir, &rendered));
            let exists = dir.as_ref().is_some_and(|d| d.exists());

            StarEntry {
                full_name: repo.full_name.clone(),
                description: repo.description.clone(),
                dir,
                exists,
                archived: repo.archived,
                fork: repo.fork,
            }
        })
        .collect()
}

/// Lists the starred repositories along with their target directories.
pub async fn list_stars<S>(ctx: &MirrorContext, source: S) -> MirrorResult<Vec<StarEntry>>
where
    S: PageSource<Item = StarredRepository> + Send + 'static,
{
    let template = DirTemplate::parse(ctx.config().get_dir_format())?;
    let output_dir = ctx.config().get_output_dir()?;
    let repos = fetch_starred(ctx, source).await?;

    Ok(describe_stars(&repos, &template, &output_dir))
}
