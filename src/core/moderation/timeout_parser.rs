// Parsing for compact durations like "30s", "5m", "2h", "1d". Timeouts,
// giveaways and polls share the format with different caps.

use std::time::Duration;
use thiserror::Error;

/// Discord refuses timeouts longer than 28 days.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(28 * 24 * 60 * 60);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeoutParseError {
    #[error("Invalid time format! Use: 1s, 5m, 2h, 1d")]
    InvalidFormat,
    #[error("Duration cannot exceed {max_days} days!")]
    TooLong { max_days: u64 },
}

/// Parse a manual timeout length, capped at [`MAX_TIMEOUT`].
pub fn parse_timeout(input: &str) -> Result<Duration, TimeoutParseError> {
    parse_duration_within(input, MAX_TIMEOUT)
}

/// Parse a compact duration (`<number><s|m|h|d>`, case-insensitive) that
/// must be non-zero and no longer than `max`.
pub fn parse_duration_within(input: &str, max: Duration) -> Result<Duration, TimeoutParseError> {
    let too_long = TimeoutParseError::TooLong {
        max_days: max.as_secs() / 86_400,
    };
    let input = input.trim().to_lowercase();

    let (num_str, multiplier) = match input.char_indices().last() {
        Some((idx, 's')) => (&input[..idx], 1u64),
        Some((idx, 'm')) => (&input[..idx], 60),
        Some((idx, 'h')) => (&input[..idx], 3600),
        Some((idx, 'd')) => (&input[..idx], 86400),
        _ => return Err(TimeoutParseError::InvalidFormat),
    };

    if num_str.is_empty() || !num_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(TimeoutParseError::InvalidFormat);
    }

    // Digits only, so a parse failure is an overflow
    let number: u64 = num_str.parse().map_err(|_| too_long.clone())?;
    let secs = number.checked_mul(multiplier).ok_or_else(|| too_long.clone())?;

    let duration = Duration::from_secs(secs);
    if duration > max {
        return Err(too_long);
    }
    if duration.is_zero() {
        return Err(TimeoutParseError::InvalidFormat);
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_units() {
        assert_eq!(parse_timeout("45s"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_timeout("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_timeout("2H"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_timeout("1d"), Ok(Duration::from_secs(86400)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timeout("m"), Err(TimeoutParseError::InvalidFormat));
        assert_eq!(parse_timeout("5 minutes"), Err(TimeoutParseError::InvalidFormat));
        assert_eq!(parse_timeout("1w"), Err(TimeoutParseError::InvalidFormat));
        assert_eq!(parse_timeout("-5m"), Err(TimeoutParseError::InvalidFormat));
        assert_eq!(parse_timeout("0s"), Err(TimeoutParseError::InvalidFormat));
    }

    #[test]
    fn test_max_is_28_days() {
        assert_eq!(parse_timeout("28d"), Ok(MAX_TIMEOUT));
        assert_eq!(
            parse_timeout("29d"),
            Err(TimeoutParseError::TooLong { max_days: 28 })
        );
    }

    #[test]
    fn test_huge_numbers_are_too_long() {
        assert_eq!(
            parse_timeout("99999999999999999999999s"),
            Err(TimeoutParseError::TooLong { max_days: 28 })
        );
        assert_eq!(
            parse_timeout("18446744073709551615d"),
            Err(TimeoutParseError::TooLong { max_days: 28 })
        );
    }

    #[test]
    fn test_custom_cap() {
        let week = Duration::from_secs(7 * 86_400);
        assert_eq!(parse_duration_within("7d", week), Ok(week));
        assert_eq!(
            parse_duration_within("169h", week),
            Err(TimeoutParseError::TooLong { max_days: 7 })
        );
    }
}
