use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;
use starsync_config::config::get_config;
use starsync_operations::{MirrorError, MirrorResult};
use ureq::http::{HeaderMap, HeaderName, HeaderValue};

pub struct Icons;

impl Icons {
    pub const ARROW: &str = "→";
    pub const CHECK: &str = "✓";
    pub const CLONE: &str = "⬇";
    pub const CROSS: &str = "✗";
    pub const MISSING: &str = "○";
    pub const PULL: &str = "↻";
    pub const SKIP: &str = "⊘";
    pub const WARNING: &str = "⚠";
}

pub fn icon_or<'a>(icon: &'a str, fallback: &'a str) -> &'a str {
    if get_config().display().icons() {
        icon
    } else {
        fallback
    }
}

pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));
pub static PROGRESS: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn progress_enabled() -> bool {
    *PROGRESS.read().unwrap() && get_config().display().progress()
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap();
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Parses `key:value` request headers.
pub fn parse_headers(headers: &[String]) -> MirrorResult<HeaderMap> {
    let mut map = HeaderMap::new();

    for header in headers {
        let (key, value) = header
            .split_once(':')
            .ok_or_else(|| MirrorError::Custom(format!("Invalid header '{header}'")))?;

        let name = key
            .trim()
            .parse::<HeaderName>()
            .map_err(|err| MirrorError::Custom(format!("Invalid header name '{key}': {err}")))?;
        let value = value
            .trim()
            .parse::<HeaderValue>()
            .map_err(|err| MirrorError::Custom(format!("Invalid header value for '{key}': {err}")))?;

        map.append(name, value);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&[
            "X-Trace: abc".to_string(),
            "accept:application/json".to_string(),
        ])
        .unwrap();

        assert_eq!(headers.get("x-trace").unwrap(), "abc");
        assert_eq!(headers.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn test_parse_headers_rejects_missing_colon() {
        assert!(parse_headers(&["no-colon".to_string()]).is_err());
    }

    #[test]
    #[serial]
    fn test_colored_without_color() {
        *COLOR.write().unwrap() = false;
        assert_eq!(Colored(Color::Red, "plain").to_string(), "plain");
        *COLOR.write().unwrap() = true;
    }
}
