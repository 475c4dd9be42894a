use std::time::Duration;

/// Parses a compact duration string such as `1d2h30m` into milliseconds.
///
/// Each component is a run of digits followed by one of `s`, `m`, `h` or `d`.
/// Returns `None` on malformed input or overflow. The empty string is zero.
///
/// # Examples
///
/// ```
/// use aurq_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1h30m"), Some(90 * 60 * 1000));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<u128> {
    let mut total: u128 = 0;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            chars.next();
        }

        if digits.is_empty() {
            return None;
        }

        let value: u128 = digits.parse().ok()?;
        let unit_ms: u128 = match chars.next()? {
            's' => 1000,
            'm' => 60 * 1000,
            'h' => 60 * 60 * 1000,
            'd' => 24 * 60 * 60 * 1000,
            _ => return None,
        };

        total = total.checked_add(value.checked_mul(unit_ms)?)?;
    }

    Some(total)
}

/// Parses a refresh interval in milliseconds.
///
/// Accepts the keywords `always` (refresh on every use) and `never`
/// (keep whatever is on disk) in addition to [`parse_duration`] strings.
pub fn parse_interval(input: &str) -> Option<u128> {
    match input.trim() {
        "always" => Some(0),
        "never" => Some(u128::MAX),
        value => parse_duration(value),
    }
}

/// Parses a timeout into a [`Duration`]; a zero length means no timeout.
pub fn parse_timeout(input: &str) -> Option<Option<Duration>> {
    let millis = parse_duration(input.trim())?;
    let millis = u64::try_from(millis).ok()?;
    Some((millis > 0).then(|| Duration::from_millis(millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s"), Some(1000));
        assert_eq!(parse_duration("1m"), Some(60 * 1000));
        assert_eq!(parse_duration("1h"), Some(60 * 60 * 1000));
        assert_eq!(parse_duration("1d"), Some(24 * 60 * 60 * 1000));
        assert_eq!(
            parse_duration("1d1h1m1s"),
            Some(24 * 60 * 60 * 1000 + 60 * 60 * 1000 + 60 * 1000 + 1000)
        );
        assert_eq!(parse_duration("12h"), Some(12 * 60 * 60 * 1000));
        assert_eq!(parse_duration("1d1h1m1s1"), None);
        assert_eq!(parse_duration("1x"), None);
        assert_eq!(parse_duration("fail"), None);
        assert_eq!(parse_duration(""), Some(0));
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(
            parse_duration("340282366920938463463374607431768211456s"),
            None
        );
        assert_eq!(
            parse_duration("340282366920938463463374607431768211455d"),
            None
        );
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("always"), Some(0));
        assert_eq!(parse_interval("never"), Some(u128::MAX));
        assert_eq!(parse_interval(" 1d "), Some(24 * 60 * 60 * 1000));
        assert_eq!(parse_interval("sometimes"), None);
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("30s"), Some(Some(Duration::from_secs(30))));
        assert_eq!(parse_timeout("0s"), Some(None));
        assert_eq!(parse_timeout("abc"), None);
    }
}
