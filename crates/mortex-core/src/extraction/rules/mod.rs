//! Rule tables for the six statement fields.
//!
//! Each field owns an ordered list of [`FieldRule`]s, most specific label first.
//! A rule looks only at the first match of its pattern; a rejected match hands
//! over to the next rule. `note_rate` additionally has a [`WindowScan`] over its
//! rate history table, tried after all labeled rules.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod rates;

pub use amounts::{normalize_balance, normalize_payment, parse_decimal};
pub use dates::{normalize_date, parse_statement_date};
pub use rates::{correct_rate_glyphs, most_frequent, normalize_rate};

use chrono::{Datelike, Utc};
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::models::statement::FieldName;

use patterns::*;

/// Confidence of a date that matched its label but could not be parsed.
pub const VERBATIM_CONFIDENCE: f32 = 0.50;

/// A captured token after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Output value.
    pub value: String,
    /// Numeric reading, for fields validated by magnitude.
    pub number: Option<Decimal>,
    /// The value is the raw token because it could not be interpreted.
    pub verbatim: bool,
}

impl Normalized {
    pub fn number(value: impl Into<String>, number: Decimal) -> Self {
        Self {
            value: value.into(),
            number: Some(number),
            verbatim: false,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            number: None,
            verbatim: false,
        }
    }

    pub fn verbatim(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            number: None,
            verbatim: true,
        }
    }
}

/// Inputs to normalization that do not come from the text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext {
    /// Year that two-digit years are resolved around.
    pub reference_year: i32,
}

impl RuleContext {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Context anchored on the current calendar year.
    pub fn current() -> Self {
        Self::new(Utc::now().year())
    }
}

impl Default for RuleContext {
    fn default() -> Self {
        Self::current()
    }
}

/// Turns a captured token into a value.
pub type Normalizer = fn(FieldName, &str, &RuleContext) -> Result<Normalized, ExtractionError>;

/// Checks a normalized value against its sanity bound.
pub type Validator = fn(FieldName, &Normalized) -> Result<(), ExtractionError>;

/// One labeled pattern with its confidence tier.
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub pattern: &'static Regex,
    pub confidence: f32,
    pub normalizer: Normalizer,
    pub validator: Validator,
}

impl FieldRule {
    /// Evaluate the first match of the pattern.
    ///
    /// `None` when the pattern does not match at all.
    pub fn apply(
        &self,
        field: FieldName,
        text: &str,
        context: &RuleContext,
    ) -> Option<Result<Normalized, ExtractionError>> {
        let token = self.pattern.captures(text)?.get(1)?.as_str();
        Some((self.normalizer)(field, token, context).and_then(|normalized| {
            (self.validator)(field, &normalized)?;
            Ok(normalized)
        }))
    }

    /// Confidence for a value this rule produced.
    pub fn confidence_for(&self, normalized: &Normalized) -> f32 {
        if normalized.verbatim {
            VERBATIM_CONFIDENCE
        } else {
            self.confidence
        }
    }
}

/// Vote over every token in a bounded window after a heading.
#[derive(Clone, Copy)]
pub struct WindowScan {
    pub heading: &'static Regex,
    /// Window length in characters after the end of the heading.
    pub span_chars: usize,
    pub token: &'static Regex,
    pub confidence: f32,
    pub normalizer: Normalizer,
    pub validator: Validator,
}

impl WindowScan {
    /// Most frequent valid value in the window following the first heading.
    pub fn apply(&self, field: FieldName, text: &str, context: &RuleContext) -> Option<String> {
        let heading = self.heading.find(text)?;
        let window = char_window(&text[heading.end()..], self.span_chars);

        let valid: Vec<String> = self
            .token
            .find_iter(window)
            .filter_map(|m| {
                (self.normalizer)(field, m.as_str(), context)
                    .and_then(|normalized| {
                        (self.validator)(field, &normalized)?;
                        Ok(normalized.value)
                    })
                    .ok()
            })
            .collect();

        most_frequent(&valid).map(str::to_string)
    }
}

/// Ordered rules for one field.
#[derive(Clone)]
pub struct FieldRules {
    pub field: FieldName,
    pub rules: Vec<FieldRule>,
    pub window: Option<WindowScan>,
}

/// First `chars` characters of `text`.
pub fn char_window(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// The built-in rule set for all six fields, in output order.
pub fn statement_rules() -> Vec<FieldRules> {
    vec![
        FieldRules {
            field: FieldName::PrincipalBalance,
            rules: vec![FieldRule {
                pattern: &PRINCIPAL_BALANCE,
                confidence: 0.90,
                normalizer: |field, token, _| amounts::normalize_balance(field, token),
                validator: amounts::accept_number,
            }],
            window: None,
        },
        FieldRules {
            field: FieldName::NoteRate,
            rules: vec![FieldRule {
                pattern: &NOTE_RATE,
                confidence: 0.90,
                normalizer: |field, token, _| rates::normalize_rate(field, token),
                validator: rates::validate_rate,
            }],
            window: Some(WindowScan {
                heading: &RATE_TABLE_HEADING,
                span_chars: 500,
                token: &RATE_TOKEN,
                confidence: 0.70,
                normalizer: |field, token, _| rates::normalize_rate(field, token),
                validator: rates::validate_rate,
            }),
        },
        FieldRules {
            field: FieldName::ScheduledPi,
            rules: [(&*PI_LABELED, 0.90), (&*PI_PAYMENT, 0.80), (&*PI_AMOUNT_DUE, 0.65)]
                .into_iter()
                .map(|(pattern, confidence)| FieldRule {
                    pattern,
                    confidence,
                    normalizer: |field, token, _| amounts::normalize_payment(field, token),
                    validator: amounts::validate_payment,
                })
                .collect(),
            window: None,
        },
        FieldRules {
            field: FieldName::Escrow,
            rules: vec![FieldRule {
                pattern: &ESCROW,
                confidence: 0.85,
                normalizer: |field, token, _| amounts::normalize_balance(field, token),
                validator: amounts::accept_number,
            }],
            window: None,
        },
        FieldRules {
            field: FieldName::NextDueDate,
            rules: vec![FieldRule {
                pattern: &NEXT_DUE_DATE,
                confidence: 0.90,
                normalizer: dates::normalize_date,
                validator: dates::accept_date,
            }],
            window: None,
        },
        FieldRules {
            field: FieldName::MaturityDate,
            rules: vec![FieldRule {
                pattern: &MATURITY_DATE,
                confidence: 0.90,
                normalizer: dates::normalize_date,
                validator: dates::accept_date,
            }],
            window: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rules_cover_every_field_in_order() {
        let fields: Vec<FieldName> = statement_rules().iter().map(|r| r.field).collect();
        assert_eq!(fields, FieldName::ALL.to_vec());
    }

    #[test]
    fn test_rule_reports_no_match() {
        let rules = statement_rules();
        let rule = rules[0].rules[0];
        assert!(rule.apply(FieldName::PrincipalBalance, "nothing here", &RuleContext::new(2026)).is_none());
    }

    #[test]
    fn test_char_window_counts_characters() {
        assert_eq!(char_window("§§§abc", 4), "§§§a");
        assert_eq!(char_window("ab", 10), "ab");
    }

    #[test]
    fn test_window_scan_votes() {
        let rules = statement_rules();
        let scan = rules[1].window.unwrap();
        let text = "Interest Rates\n01/2024 4.25%\n01/2025 S.5600%\n01/2026 5.5600%\n01/2027 31.00%";

        assert_eq!(scan.apply(FieldName::NoteRate, text, &RuleContext::new(2026)), Some("5.5600".to_string()));
    }

    #[test]
    fn test_window_scan_ignores_tokens_past_window() {
        let rules = statement_rules();
        let scan = rules[1].window.unwrap();
        let text = format!("Interest Rates {} 4.25%", " ".repeat(500));

        assert_eq!(scan.apply(FieldName::NoteRate, &text, &RuleContext::new(2026)), None);
    }
}
