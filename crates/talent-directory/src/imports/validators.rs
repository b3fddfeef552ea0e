//! Field predicates and the row guards built on them.
//!
//! The predicates are pure and work on `&str`. The guards read a column from a
//! [`CsvRow`], trim it, and turn a failed check into a [`RowError`] that names the
//! column, the value and what was expected.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::parser::CsvRow;
use super::RowError;

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && labels.last().is_some_and(|tld| tld.chars().count() >= 2)
}

/// Calendar date from `YYYY-MM-DD`, an RFC 3339 timestamp, or a naive
/// `YYYY-MM-DD[T ]HH:MM:SS` timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    parse_date_time(value).map(|moment| moment.date_naive())
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Instant in UTC. Naive timestamps are read as UTC and a bare date means
/// midnight.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    parse_date_time(value).or_else(|| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    })
}

fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Some(moment.with_timezone(&Utc));
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Whole number, also accepting a float spelling with no fractional part
/// (`85.0`).
pub fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(number) = value.parse::<i64>() {
        return Some(number);
    }

    let number = value.parse::<f64>().ok()?;
    let in_range = number >= i64::MIN as f64 && number <= i64::MAX as f64;
    (number.is_finite() && number.fract() == 0.0 && in_range).then_some(number as i64)
}

pub fn is_integer(value: &str) -> bool {
    parse_integer(value).is_some()
}

pub fn is_one_of(value: &str, allowed: &[&str]) -> bool {
    let value = value.trim();
    allowed
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(value))
}

/// `true` and `1` are truthy; anything else, blank included, is false.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Trimmed value of a column that must be present and non-blank.
pub fn required<'r>(row: &'r CsvRow, field: &'static str) -> Result<&'r str, RowError> {
    optional(row, field).ok_or(RowError::MissingField { field })
}

/// Trimmed value of a column, `None` when absent or blank.
pub fn optional<'r>(row: &'r CsvRow, field: &str) -> Option<&'r str> {
    row.get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn optional_owned(row: &CsvRow, field: &str) -> Option<String> {
    optional(row, field).map(str::to_string)
}

/// Lowercased email.
pub fn email_field(field: &'static str, value: &str) -> Result<String, RowError> {
    if !is_valid_email(value) {
        return Err(invalid(field, value, "an address like name@example.com"));
    }
    Ok(value.to_lowercase())
}

pub fn date_field(field: &'static str, value: &str) -> Result<NaiveDate, RowError> {
    parse_date(value).ok_or_else(|| invalid(field, value, "a date in YYYY-MM-DD form"))
}

pub fn timestamp_field(field: &'static str, value: &str) -> Result<DateTime<Utc>, RowError> {
    parse_timestamp(value)
        .ok_or_else(|| invalid(field, value, "an ISO 8601 date or timestamp"))
}

pub fn integer_field(field: &'static str, value: &str) -> Result<i64, RowError> {
    parse_integer(value).ok_or_else(|| invalid(field, value, "a whole number"))
}

/// Case-insensitive membership check followed by the enum's own parser.
pub fn enum_field<T>(
    field: &'static str,
    value: &str,
    allowed: &[&str],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RowError> {
    let expected = || format!("one of {}", allowed.join(", "));
    if !is_one_of(value, allowed) {
        return Err(invalid(field, value, &expected()));
    }
    parse(value).ok_or_else(|| invalid(field, value, &expected()))
}

pub(crate) fn invalid(field: &'static str, value: &str, expected: &str) -> RowError {
    RowError::Validation {
        field,
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::parser::parse_rows;
    use crate::store::SkillLevel;
    use chrono::{Datelike, Timelike};

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));

        for bad in [
            "",
            "ada",
            "ada@",
            "@example.com",
            "ada@example",
            "ada@example.c",
            "ada@@example.com",
            "ada@exa mple.com",
            "ada@example..com",
            "ada@.com",
        ] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid");
        assert_eq!(parse_date("2025-01-15"), Some(expected));
        assert_eq!(parse_date(" 2025-01-15 "), Some(expected));
        assert_eq!(parse_date("2025-01-15T10:00:00Z"), Some(expected));
        assert_eq!(parse_date("2025-01-15T10:00:00"), Some(expected));
        assert_eq!(parse_date("2025-01-15 10:00:00"), Some(expected));

        assert!(!is_valid_date("2025-02-30"));
        assert!(!is_valid_date("15/01/2025"));
        assert!(!is_valid_date("yesterday"));
    }

    #[test]
    fn timestamps_normalize_to_utc() {
        let moment = parse_timestamp("2025-01-15T12:00:00+02:00").expect("timestamp");
        assert_eq!(moment.hour(), 10);

        let midnight = parse_timestamp("2025-01-15").expect("date");
        assert_eq!((midnight.day(), midnight.hour()), (15, 0));
    }

    #[test]
    fn integer_shapes() {
        assert_eq!(parse_integer("85"), Some(85));
        assert_eq!(parse_integer("-3"), Some(-3));
        assert_eq!(parse_integer("85.0"), Some(85));
        assert_eq!(parse_integer("85.5"), None);
        assert_eq!(parse_integer("NaN"), None);
        assert_eq!(parse_integer("inf"), None);
        assert!(!is_integer("eighty"));
    }

    #[test]
    fn enum_membership_ignores_case() {
        assert!(is_one_of("Advanced", &SkillLevel::ALLOWED));
        assert!(!is_one_of("expert", &SkillLevel::ALLOWED));
    }

    #[test]
    fn truthy_values() {
        for value in ["true", "TRUE", "True", "1", " true "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["", "false", "yes", "0"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[test]
    fn required_rejects_blank_values() {
        let rows = parse_rows("full_name,email\n   ,ada@example.com\n").expect("parse");
        match required(&rows[0], "full_name") {
            Err(RowError::MissingField { field }) => assert_eq!(field, "full_name"),
            other => panic!("expected missing field, got {other:?}"),
        }
        assert!(matches!(
            required(&rows[0], "phone"),
            Err(RowError::MissingField { field: "phone" })
        ));
    }

    #[test]
    fn email_field_lowercases_and_reports_value() {
        let rows = parse_rows("email\n Ada@Example.COM \nnot-an-email\n").expect("parse");
        let first = required(&rows[0], "email").expect("present");
        assert_eq!(email_field("email", first).expect("valid"), "ada@example.com");

        match email_field("email", "not-an-email") {
            Err(RowError::Validation { field, value, .. }) => {
                assert_eq!(field, "email");
                assert_eq!(value, "not-an-email");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn enum_field_lists_allowed_values() {
        let error = enum_field("skill_level", "expert", &SkillLevel::ALLOWED, SkillLevel::parse)
            .expect_err("expert is not a level");
        assert!(error.to_string().contains("beginner, intermediate, advanced"));
    }
}
