//! Interest rate normalization, glyph correction, and rate table voting.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::models::statement::FieldName;

use super::Normalized;
use super::amounts::parse_decimal;
use super::patterns::{RATE_GLYPH_FRACTION, RATE_GLYPH_TWO_DIGIT};

/// Upper bound of a plausible note rate, in percent.
pub const MAX_NOTE_RATE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Undo OCR misreads of a leading `5` as `§` or `S` in a percent token.
///
/// `§.5600%` becomes `5.5600%` and `S5.1200%` becomes `55.1200%`. Other tokens are
/// returned unchanged.
pub fn correct_rate_glyphs(token: &str) -> String {
    if let Some(caps) = RATE_GLYPH_FRACTION.captures(token) {
        return format!("5.{}%", &caps[1]);
    }
    if let Some(caps) = RATE_GLYPH_TWO_DIGIT.captures(token) {
        return format!("5{}.{}%", &caps[1], &caps[2]);
    }
    token.to_string()
}

/// Normalize a rate token, with or without its percent sign, to a bare number string.
pub fn normalize_rate(field: FieldName, token: &str) -> Result<Normalized, ExtractionError> {
    let with_percent = if token.ends_with('%') {
        token.to_string()
    } else {
        format!("{}%", token)
    };

    let corrected = correct_rate_glyphs(&with_percent);
    let value = corrected.trim_end_matches('%').to_string();
    let number = parse_decimal(field, &value)?;
    Ok(Normalized::number(value, number))
}

/// Rates must satisfy `0 < rate <= 25`.
pub fn validate_rate(field: FieldName, normalized: &Normalized) -> Result<(), ExtractionError> {
    let rate = normalized.number.ok_or_else(|| ExtractionError::Parse {
        field: field.to_string(),
        value: normalized.value.clone(),
    })?;

    if rate <= Decimal::ZERO || rate > MAX_NOTE_RATE {
        return Err(ExtractionError::Validation {
            field: field.to_string(),
            reason: format!("{}% outside (0, {}]", rate, MAX_NOTE_RATE),
        });
    }
    Ok(())
}

/// Most frequent value; ties go to the value seen first.
pub fn most_frequent(values: &[String]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for value in values {
        let count = counts[value.as_str()];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value.as_str(), count));
        }
    }
    best.map(|(value, _)| value)
}
