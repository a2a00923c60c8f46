/// Placeholder written in place of secrets.
pub const REDACTED: &str = "***";

/// Replaces every occurrence of `secret` in `text` with [`REDACTED`].
///
/// An empty secret leaves the text untouched.
///
/// # Examples
///
/// ```
/// use starsync_utils::string::redact;
///
/// let url = "https://ghp_abc@github.com/rust-lang/rust.git";
/// assert_eq!(redact(url, "ghp_abc"), "https://***@github.com/rust-lang/rust.git");
/// ```
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_all_occurrences() {
        let text = "fatal: could not read from https://tok@host/a (tok)";
        assert_eq!(
            redact(text, "tok"),
            "fatal: could not read from https://***@host/a (***)"
        );
    }

    #[test]
    fn test_redact_empty_secret() {
        assert_eq!(redact("nothing to hide", ""), "nothing to hide");
    }
}
