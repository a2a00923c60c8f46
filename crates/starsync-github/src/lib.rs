pub mod error;
pub mod github;
pub mod http_client;
pub mod pagination;
pub mod types;

pub use error::GithubError;
pub use github::{starred_url, GithubClient, StarredRepository};
pub use pagination::{collect_pages, Page, PageSource};
pub use types::ListingProgress;
