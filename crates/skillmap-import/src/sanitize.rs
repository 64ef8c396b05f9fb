//! Field sanitization for roster rows.
//!
//! Turns raw string fields into typed values. Every failure here is
//! row-local data (a [`RowError`]), never an infrastructure error; the row
//! processor skips the whole row on the first failure.

use chrono::NaiveDate;

use skillmap_core::{RowError, RowErrorCode};

/// Accepted hire-date formats, tried in order; the first successful parse
/// wins. Order matters for ambiguous day/month values.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%m/%d/%Y"];

/// Typed scalar fields of one roster row.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedFields {
    pub external_ref: String,
    pub full_name: String,
    pub email: Option<String>,
    pub hired_on: Option<NaiveDate>,
    pub allocation_pct: Option<f32>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a date string against [`DATE_FORMATS`].
pub fn parse_date(value: &str) -> Result<NaiveDate, RowError> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    Err(RowError::new(
        RowErrorCode::MalformedDate,
        format!("unrecognized date '{}'", value),
    ))
}

/// Parse an allocation percentage. Accepts a trailing `%`; must land in
/// `0..=100`.
pub fn parse_allocation(value: &str) -> Result<f32, RowError> {
    let trimmed = value.trim().trim_end_matches('%').trim();
    let parsed: f32 = trimmed.parse().map_err(|_| {
        RowError::new(
            RowErrorCode::MalformedNumber,
            format!("unrecognized allocation '{}'", value),
        )
    })?;
    if !(0.0..=100.0).contains(&parsed) {
        return Err(RowError::new(
            RowErrorCode::MalformedNumber,
            format!("allocation {} outside 0..=100", parsed),
        ));
    }
    Ok(parsed)
}

/// Sanitize the scalar fields of one row. The first failure aborts and is
/// reported for the row as a whole.
pub fn sanitize_fields(
    external_ref: Option<&str>,
    full_name: Option<&str>,
    email: Option<&str>,
    hired_on: Option<&str>,
    allocation: Option<&str>,
) -> Result<SanitizedFields, RowError> {
    let external_ref = non_empty(external_ref)
        .ok_or_else(|| RowError::new(RowErrorCode::MissingField, "employee reference is empty"))?
        .to_string();
    let full_name = non_empty(full_name)
        .ok_or_else(|| RowError::new(RowErrorCode::MissingField, "full name is empty"))?
        .to_string();

    let email = non_empty(email).map(String::from);
    let hired_on = non_empty(hired_on).map(parse_date).transpose()?;
    let allocation_pct = non_empty(allocation).map(parse_allocation).transpose()?;

    Ok(SanitizedFields {
        external_ref,
        full_name,
        email,
        hired_on,
        allocation_pct,
    })
}

/// Split the skill column into raw tokens on commas and semicolons,
/// dropping empties. Tokens keep their verbatim text.
pub fn split_skill_tokens(skills: Option<&str>) -> Vec<String> {
    skills
        .unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_first_format_wins() {
        // 03/04 is ambiguous; the %d/%m/%Y pattern is tried first.
        let date = parse_date("03/04/2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
    }

    #[test]
    fn test_date_formats() {
        assert!(parse_date("2024-01-15").is_ok());
        assert!(parse_date("15.01.2024").is_ok());
        assert!(parse_date("01/15/2024").is_ok());
        let err = parse_date("yesterday").unwrap_err();
        assert_eq!(err.code, RowErrorCode::MalformedDate);
    }

    #[test]
    fn test_allocation_parsing() {
        assert_eq!(parse_allocation("75").unwrap(), 75.0);
        assert_eq!(parse_allocation("75%").unwrap(), 75.0);
        assert_eq!(parse_allocation(" 100 % ").unwrap(), 100.0);
        assert_eq!(
            parse_allocation("120").unwrap_err().code,
            RowErrorCode::MalformedNumber
        );
        assert_eq!(
            parse_allocation("lots").unwrap_err().code,
            RowErrorCode::MalformedNumber
        );
    }

    #[test]
    fn test_sanitize_requires_ref_and_name() {
        let err = sanitize_fields(None, Some("Ada"), None, None, None).unwrap_err();
        assert_eq!(err.code, RowErrorCode::MissingField);
        let err = sanitize_fields(Some("E-1"), Some("  "), None, None, None).unwrap_err();
        assert_eq!(err.code, RowErrorCode::MissingField);
    }

    #[test]
    fn test_sanitize_optional_fields_empty_ok() {
        let fields =
            sanitize_fields(Some("E-1"), Some("Ada"), Some(""), Some(""), Some("")).unwrap();
        assert!(fields.email.is_none());
        assert!(fields.hired_on.is_none());
        assert!(fields.allocation_pct.is_none());
    }

    #[test]
    fn test_sanitize_bad_date_fails_row() {
        let err = sanitize_fields(Some("E-1"), Some("Ada"), None, Some("soon"), None).unwrap_err();
        assert_eq!(err.code, RowErrorCode::MalformedDate);
    }

    #[test]
    fn test_split_skill_tokens() {
        assert_eq!(
            split_skill_tokens(Some("rust, sql; python ,, ;")),
            vec!["rust", "sql", "python"]
        );
        assert!(split_skill_tokens(None).is_empty());
        assert!(split_skill_tokens(Some("   ")).is_empty());
    }
}
