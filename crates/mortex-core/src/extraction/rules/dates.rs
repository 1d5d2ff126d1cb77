//! Date parsing for statement due and maturity dates.

use chrono::NaiveDate;

use crate::error::ExtractionError;
use crate::models::statement::FieldName;

use super::{Normalized, RuleContext};
use super::patterns::{DATE_NUMERIC, DATE_TEXTUAL};

/// Parse the two date shapes the date labels capture.
///
/// Numeric dates are read month first, falling back to day first when only that
/// order yields a real date. Textual dates take a full or abbreviated English
/// month name. Two-digit years resolve to the century that puts them within
/// 50 years of `reference_year`.
pub fn parse_statement_date(token: &str, reference_year: i32) -> Option<NaiveDate> {
    let token = token.trim();

    if let Some(caps) = DATE_NUMERIC.captures(token) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3], reference_year)?;
        return NaiveDate::from_ymd_opt(year, first, second)
            .or_else(|| NaiveDate::from_ymd_opt(year, second, first));
    }

    if let Some(caps) = DATE_TEXTUAL.captures(token) {
        let month = month_to_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// ISO date when the token parses; the token verbatim otherwise.
pub fn normalize_date(
    _field: FieldName,
    token: &str,
    context: &RuleContext,
) -> Result<Normalized, ExtractionError> {
    Ok(match parse_statement_date(token, context.reference_year) {
        Some(date) => Normalized::text(date.format("%Y-%m-%d").to_string()),
        None => Normalized::verbatim(token),
    })
}

/// A matched date is always kept, parsed or not.
pub fn accept_date(_field: FieldName, _normalized: &Normalized) -> Result<(), ExtractionError> {
    Ok(())
}

fn parse_year(s: &str, reference_year: i32) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() != 2 {
        return Some(year);
    }

    // Window is [reference - 50, reference + 50)
    let mut resolved = reference_year - reference_year.rem_euclid(100) + year;
    if resolved >= reference_year + 50 {
        resolved -= 100;
    } else if resolved < reference_year - 50 {
        resolved += 100;
    }
    Some(resolved)
}

fn month_to_number(month: &str) -> Option<u32> {
    let number = match month.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REFERENCE_YEAR: i32 = 2026;

    fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn parse(token: &str) -> Option<NaiveDate> {
        parse_statement_date(token, REFERENCE_YEAR)
    }

    #[test]
    fn test_numeric_month_first() {
        assert_eq!(parse("01/15/2045"), ymd(2045, 1, 15));
        assert_eq!(parse("3-1-2025"), ymd(2025, 3, 1));
    }

    #[test]
    fn test_numeric_day_first_fallback() {
        assert_eq!(parse("15/01/2045"), ymd(2045, 1, 15));
        assert_eq!(parse("13/13/2045"), None);
    }

    #[test]
    fn test_two_digit_year_window() {
        assert_eq!(parse("04/01/25"), ymd(2025, 4, 1));
        assert_eq!(parse("04/01/50"), ymd(2050, 4, 1));
        assert_eq!(parse("09/01/52"), ymd(2052, 9, 1));
        assert_eq!(parse("01/01/75"), ymd(2075, 1, 1));
        assert_eq!(parse("01/01/76"), ymd(1976, 1, 1));
        assert_eq!(parse("04/01/99"), ymd(1999, 4, 1));
    }

    #[test]
    fn test_two_digit_year_follows_reference() {
        assert_eq!(parse_statement_date("09/01/52", 1990), ymd(1952, 9, 1));
        assert_eq!(parse_statement_date("09/01/99", 2060), ymd(2099, 9, 1));
        assert_eq!(parse_statement_date("09/01/05", 1960), ymd(2005, 9, 1));
    }

    #[test]
    fn test_four_digit_year_ignores_reference() {
        assert_eq!(parse_statement_date("09/01/1952", 2026), ymd(1952, 9, 1));
    }

    #[test]
    fn test_textual_dates() {
        assert_eq!(parse("March 1, 2025"), ymd(2025, 3, 1));
        assert_eq!(parse("Sept 30 2031"), ymd(2031, 9, 30));
        assert_eq!(parse("DEC 1, 2054"), ymd(2054, 12, 1));
        assert_eq!(parse("February 30, 2025"), None);
        assert_eq!(parse("Upon 1, 2025"), None);
    }

    #[test]
    fn test_normalize_keeps_unparsed_token() {
        let context = RuleContext::new(REFERENCE_YEAR);
        let parsed = normalize_date(FieldName::MaturityDate, "01/15/2045", &context).unwrap();
        assert_eq!(parsed.value, "2045-01-15");
        assert!(!parsed.verbatim);

        let raw = normalize_date(FieldName::MaturityDate, "02/30/2045", &context).unwrap();
        assert_eq!(raw.value, "02/30/2045");
        assert!(raw.verbatim);
    }
}
