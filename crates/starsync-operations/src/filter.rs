use fast_glob::glob_match;

/// Selects repositories by glob patterns over `owner/name`.
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub case_sensitive: bool,
}

impl RepoFilter {
    /// Determines whether `full_name` should be mirrored.
    ///
    /// A name is kept when `include` is empty or any include glob matches, and
    /// no exclude glob matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use starsync_operations::filter::RepoFilter;
    ///
    /// let filter = RepoFilter {
    ///     include: vec!["rust-lang/*".into()],
    ///     exclude: vec!["*/rustlings".into()],
    ///     case_sensitive: false,
    /// };
    /// assert!(filter.matches("rust-lang/cargo"));
    /// assert!(!filter.matches("rust-lang/rustlings"));
    /// assert!(!filter.matches("tokio-rs/tokio"));
    /// ```
    pub fn matches(&self, full_name: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|g| self.glob(g, full_name));
        let excluded = self.exclude.iter().any(|g| self.glob(g, full_name));

        included && !excluded
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    fn glob(&self, pattern: &str, name: &str) -> bool {
        if self.case_sensitive {
            glob_match(pattern, name)
        } else {
            glob_match(&pattern.to_lowercase(), &name.to_lowercase())
        }
    }
}
