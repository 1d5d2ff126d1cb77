//! Currency amount normalization and bounds.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ExtractionError;
use crate::models::statement::FieldName;

use super::Normalized;

/// Smallest plausible scheduled principal and interest payment.
pub const MIN_SCHEDULED_PAYMENT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Largest plausible scheduled principal and interest payment.
pub const MAX_SCHEDULED_PAYMENT: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Parse a plain decimal token such as `1234.5` or `1234.`.
pub fn parse_decimal(field: FieldName, token: &str) -> Result<Decimal, ExtractionError> {
    let digits = token.strip_suffix('.').unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(ExtractionError::Parse {
            field: field.to_string(),
            value: token.to_string(),
        });
    }
    Decimal::from_str(digits).map_err(|_| ExtractionError::Parse {
        field: field.to_string(),
        value: token.to_string(),
    })
}

/// Strip thousands separators. The value keeps the written precision.
pub fn normalize_balance(field: FieldName, token: &str) -> Result<Normalized, ExtractionError> {
    let value = token.replace(',', "");
    let number = parse_decimal(field, &value)?;
    Ok(Normalized::number(value, number))
}

/// Strip `$` and separators from a payment token and format it to two decimals.
///
/// A bare digit string is not treated as currency.
pub fn normalize_payment(field: FieldName, token: &str) -> Result<Normalized, ExtractionError> {
    if !token.contains(['$', ',', '.']) {
        return Err(ExtractionError::Format {
            field: field.to_string(),
            value: token.to_string(),
        });
    }

    let stripped = token.replace(['$', ','], "");
    let amount = parse_decimal(field, &stripped)?;
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    Ok(Normalized::number(format!("{:.2}", rounded), amount))
}

/// Any parsed number is accepted.
pub fn accept_number(field: FieldName, normalized: &Normalized) -> Result<(), ExtractionError> {
    match normalized.number {
        Some(_) => Ok(()),
        None => Err(ExtractionError::Parse {
            field: field.to_string(),
            value: normalized.value.clone(),
        }),
    }
}

/// Scheduled payments must fall within `[100, 100000]`.
pub fn validate_payment(field: FieldName, normalized: &Normalized) -> Result<(), ExtractionError> {
    let amount = normalized.number.ok_or_else(|| ExtractionError::Parse {
        field: field.to_string(),
        value: normalized.value.clone(),
    })?;

    if amount < MIN_SCHEDULED_PAYMENT || amount > MAX_SCHEDULED_PAYMENT {
        return Err(ExtractionError::Validation {
            field: field.to_string(),
            reason: format!(
                "{} outside [{}, {}]",
                amount, MIN_SCHEDULED_PAYMENT, MAX_SCHEDULED_PAYMENT
            ),
        });
    }
    Ok(())
}
