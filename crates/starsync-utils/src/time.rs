use std::time::Duration;

/// Parses a compact duration such as `60s`, `1m30s` or `2h`.
///
/// Units are `s`, `m`, `h` and `d`; every number must carry a unit. An empty
/// input is a zero duration. Returns `None` for malformed input or overflow.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use starsync_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
/// assert_eq!(parse_duration("90"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total: u64 = 0;
    let mut chars = input.trim().chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            digits.push(c);
        }

        if digits.is_empty() {
            return None;
        }

        let value: u64 = digits.parse().ok()?;
        let unit = match chars.next()? {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return None,
        };

        total = total.checked_add(value.checked_mul(unit)?)?;
    }

    Some(Duration::from_secs(total))
}

/// Formats an elapsed duration the way task timings are reported, e.g. `1.42s`
/// or `2m3.1s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        return format!("{secs:.2}s");
    }

    let minutes = (secs / 60.0).floor();
    format!("{}m{:.1}s", minutes as u64, secs - minutes * 60.0)
}
