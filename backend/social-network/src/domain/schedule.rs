/// Parsing and validation of `scheduled_time` for deferred post creation
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{AppError, Result};

pub const INVALID_FORMAT_MESSAGE: &str = "Invalid scheduled time format.";
pub const NOT_IN_FUTURE_MESSAGE: &str = "Scheduled time must be in the future.";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with an offset, a naive date-time (taken as UTC) or a bare
/// date (midnight UTC).
pub fn parse_scheduled_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let invalid = || AppError::Validation(INVALID_FORMAT_MESSAGE.to_string());

    if raw.is_empty() {
        return Err(invalid());
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(invalid)
}

/// Parse `raw` and require it to lie strictly after `now`
pub fn validate_scheduled_time(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let run_at = parse_scheduled_time(raw)?;
    if run_at <= now {
        return Err(AppError::Validation(NOT_IN_FUTURE_MESSAGE.to_string()));
    }
    Ok(run_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parses_rfc3339_with_offset() {
        let parsed = parse_scheduled_time("2030-01-02T03:04:05+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 1, 2, 1, 4, 5).unwrap());
    }

    #[test]
    fn test_naive_times_are_utc() {
        let expected = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_scheduled_time("2030-01-02T03:04:05").unwrap(), expected);
        assert_eq!(parse_scheduled_time("2030-01-02 03:04:05").unwrap(), expected);
        assert_eq!(
            parse_scheduled_time("2030-01-02T03:04").unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 0).unwrap()
        );
        assert_eq!(
            parse_scheduled_time("2030-01-02").unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "tomorrow", "2030-13-01T00:00:00", "12/01/2030"] {
            let err = parse_scheduled_time(raw).unwrap_err();
            assert_eq!(message(err), INVALID_FORMAT_MESSAGE, "input {raw:?}");
        }
    }

    #[test]
    fn test_requires_strictly_future() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        let err = validate_scheduled_time("2030-01-01T12:00:00Z", now).unwrap_err();
        assert_eq!(message(err), NOT_IN_FUTURE_MESSAGE);

        let err = validate_scheduled_time("2029-12-31T00:00:00Z", now).unwrap_err();
        assert_eq!(message(err), NOT_IN_FUTURE_MESSAGE);

        let run_at = validate_scheduled_time("2030-01-01T12:00:01Z", now).unwrap();
        assert_eq!(run_at, now + Duration::seconds(1));
    }
}
