use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use ureq::http::{
    header::{ACCEPT, AUTHORIZATION, LINK},
    StatusCode,
};

use crate::{
    error::GithubError,
    http_client::SHARED_AGENT,
    pagination::{parse_next_link, Page, PageSource},
};

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Characters escaped in a URL path segment, plus `/` and `%`.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A repository as returned by the starred listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StarredRepository {
    /// `owner/name`
    pub full_name: String,
    pub clone_url: String,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
}

/// Client for the GitHub REST API, authenticated with a personal access token.
pub struct GithubClient {
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// URL of the first page of starred repositories on this client's API.
    pub fn starred_url(&self, user: Option<&str>, per_page: u8) -> String {
        starred_url(&self.api_url, user, per_page)
    }
}

/// URL of the first page of starred repositories.
///
/// Without `user` this lists the authenticated user's stars. The user name
/// is encoded as a single path segment.
///
/// # Examples
///
/// ```
/// use starsync_github::github::starred_url;
///
/// assert_eq!(
///     starred_url("https://api.github.com", None, 100),
///     "https://api.github.com/user/starred?per_page=100"
/// );
/// assert_eq!(
///     starred_url("https://api.github.com/", Some("octocat"), 50),
///     "https://api.github.com/users/octocat/starred?per_page=50"
/// );
/// ```
pub fn starred_url(api_url: &str, user: Option<&str>, per_page: u8) -> String {
    let api_url = api_url.trim_end_matches('/');
    match user {
        Some(user) => {
            let encoded_user = utf8_percent_encode(user, PATH_SEGMENT);
            format!("{api_url}/users/{encoded_user}/starred?per_page={per_page}")
        }
        None => format!("{api_url}/user/starred?per_page={per_page}"),
    }
}

impl PageSource for GithubClient {
    type Item = StarredRepository;

    fn fetch_page(&self, url: &str) -> Result<Page<StarredRepository>, GithubError> {
        let mut req = SHARED_AGENT
            .get(url)
            .header(ACCEPT, ACCEPT_GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION);

        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, &format!("Bearer {token}"));
        }

        let mut resp = req.call()?;

        let remaining = resp
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok());
        check_status(resp.status(), remaining, url)?;

        let next = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let items: Vec<StarredRepository> = resp.body_mut().read_json().map_err(|_| {
            GithubError::InvalidResponse {
                url: url.to_string(),
            }
        })?;

        Ok(Page {
            items,
            next,
        })
    }
}

/// Maps a response status to an error.
///
/// 429, and 403 with an exhausted `X-RateLimit-Remaining`, are rate limits.
fn check_status(status: StatusCode, remaining: Option<&str>, url: &str) -> Result<(), GithubError> {
    if status.is_success() {
        return Ok(());
    }

    let url = url.to_string();
    match status.as_u16() {
        429 => Err(GithubError::RateLimited {
            url,
        }),
        403 if remaining.map(str::trim) == Some("0") => {
            Err(GithubError::RateLimited {
                url,
            })
        }
        401 => Err(GithubError::Unauthorized {
            url,
        }),
        status => Err(GithubError::HttpError {
            status,
            url,
        }),
    }
}
