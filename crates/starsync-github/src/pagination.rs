use std::{thread, time::Duration};

use tracing::{debug, error, warn};

use crate::{error::GithubError, types::ListingProgress};

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// URL of the following page, taken from the `Link` header.
    pub next: Option<String>,
}

/// Something that can fetch a single page by URL.
pub trait PageSource {
    type Item;

    fn fetch_page(&self, url: &str) -> Result<Page<Self::Item>, GithubError>;
}

/// Extracts the `rel="next"` target from a `Link` header.
///
/// # Examples
///
/// ```
/// use starsync_github::pagination::parse_next_link;
///
/// let header = r#"<https://api.github.com/user/starred?page=2>; rel="next", <https://api.github.com/user/starred?page=5>; rel="last""#;
/// assert_eq!(
///     parse_next_link(header).as_deref(),
///     Some("https://api.github.com/user/starred?page=2")
/// );
/// ```
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim() == "rel"
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel == "next")
        });

        is_next.then(|| target.to_string())
    })
}

/// Walks every page starting at `first_url`.
///
/// A rate-limited page is retried after sleeping `wait`, as many times as it
/// takes. Any other error on the first page is returned; on a later page it is
/// logged and the items collected so far are returned.
pub fn collect_pages<S, F>(
    source: &S,
    first_url: &str,
    wait: Duration,
    on_progress: F,
) -> Result<Vec<S::Item>, GithubError>
where
    S: PageSource,
    F: Fn(ListingProgress),
{
    let mut items = Vec::new();
    let mut next = Some(first_url.to_string());
    let mut page: u32 = 1;

    while let Some(url) = next.take() {
        debug!(page, url = url.as_str(), "fetching starred page");

        match source.fetch_page(&url) {
            Ok(fetched) => {
                on_progress(ListingProgress::Page {
                    page,
                    count: fetched.items.len(),
                });
                items.extend(fetched.items);
                next = fetched.next;
                page += 1;
            }
            Err(err) if err.is_rate_limited() => {
                warn!("rate limit, sleeping for {}s", wait.as_secs());
                on_progress(ListingProgress::RateLimited {
                    page,
                    wait,
                });
                thread::sleep(wait);
                next = Some(url);
            }
            Err(err) if page == 1 => return Err(err),
            Err(err) => {
                error!("stopped listing at page {}: {}", page, err);
                break;
            }
        }
    }

    on_progress(ListingProgress::Complete {
        total: items.len(),
    });

    Ok(items)
}
