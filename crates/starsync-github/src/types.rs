use std::time::Duration;

/// Progress reported while walking the starred-repository pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingProgress {
    /// Page `page` (1-based) returned `count` items.
    Page { page: u32, count: usize },
    /// Page `page` hit the rate limit; retrying after `wait`.
    RateLimited { page: u32, wait: Duration },
    /// All pages were fetched (or listing stopped early); `total` items collected.
    Complete { total: usize },
}
