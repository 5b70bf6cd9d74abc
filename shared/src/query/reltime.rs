//! Relative-time parsing for query windows.

/// Parses a relative-time token into a number of seconds.
///
/// A bare number passes through unchanged (`"123"` is 123 seconds). A
/// relative token must carry an `-ago` suffix (`"5m-ago"` is 300); the first
/// character of the suffix selects the unit: `m` minutes, `h` hours, `d`
/// days, anything else seconds. A suffix without `-ago` yields 0.
///
/// # Example
///
/// ```
/// use shared::query::parse_rel_time;
///
/// assert_eq!(parse_rel_time("5m-ago"), 300);
/// assert_eq!(parse_rel_time("123"), 123);
/// assert_eq!(parse_rel_time("10m"), 0);
/// ```
#[must_use]
pub fn parse_rel_time(s: &str) -> u64 {
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, suffix) = s.split_at(digits_end);
    let value: u64 = digits.parse().unwrap_or(0);

    if suffix.is_empty() {
        return value;
    }
    if !suffix.contains("-ago") {
        return 0;
    }

    match suffix.as_bytes()[0] {
        b'm' => value * 60,
        b'h' => value * 60 * 60,
        b'd' => value * 60 * 60 * 24,
        _ => value,
    }
}
