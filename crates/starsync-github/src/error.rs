use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum GithubError {
    #[error(transparent)]
    #[diagnostic(
        code(starsync_github::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(starsync_github::http_error))]
    HttpError { status: u16, url: String },

    #[error("Authentication failed: {url}")]
    #[diagnostic(
        code(starsync_github::unauthorized),
        help("Check that the personal access token is valid and has the `repo` and `user` scopes")
    )]
    Unauthorized { url: String },

    #[error("API rate limit exceeded: {url}")]
    #[diagnostic(
        code(starsync_github::rate_limited),
        help("Wait for the rate limit window to reset")
    )]
    RateLimited { url: String },

    #[error("Invalid response from server: {url}")]
    #[diagnostic(code(starsync_github::invalid_response))]
    InvalidResponse { url: String },
}

impl From<ureq::Error> for GithubError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}

impl GithubError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GithubError::RateLimited { .. })
    }
}
