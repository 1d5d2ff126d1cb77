//! Field extraction over acquired statement text.

use std::time::Instant;

use tracing::{debug, trace};

use crate::models::config::MortexConfig;
use crate::models::statement::{FieldExtraction, FieldName, Provenance, StatementFields};

use super::rules::{FieldRules, RuleContext, statement_rules};

/// Applies the per-field rule tables to a block of text.
///
/// Fields are independent: a miss or rejection in one never affects another.
pub struct FieldExtractionEngine {
    rules: Vec<FieldRules>,
    context: RuleContext,
}

impl FieldExtractionEngine {
    /// Engine with the built-in statement rules, resolving two-digit years
    /// around the current year.
    pub fn new() -> Self {
        Self::with_rules(statement_rules(), RuleContext::current())
    }

    pub fn from_config(config: &MortexConfig) -> Self {
        let context = match config.extraction.reference_year {
            Some(year) => RuleContext::new(year),
            None => RuleContext::current(),
        };
        Self::with_rules(statement_rules(), context)
    }

    pub fn with_rules(rules: Vec<FieldRules>, context: RuleContext) -> Self {
        Self { rules, context }
    }

    /// Extract every field. Fields without a validated match are empty sentinels
    /// carrying `provenance`.
    pub fn extract(&self, text: &str, provenance: Provenance) -> StatementFields {
        let start = Instant::now();
        let mut fields = StatementFields::empty(provenance);

        for field_rules in &self.rules {
            if let Some(extraction) = self.extract_field(field_rules, text, provenance) {
                fields.set(field_rules.field, extraction);
            }
        }

        debug!(
            "Matched {}/{} fields in {}ms",
            fields.matched_count(),
            FieldName::ALL.len(),
            start.elapsed().as_millis()
        );
        fields
    }

    fn extract_field(
        &self,
        field_rules: &FieldRules,
        text: &str,
        provenance: Provenance,
    ) -> Option<FieldExtraction> {
        let field = field_rules.field;

        for (tier, rule) in field_rules.rules.iter().enumerate() {
            match rule.apply(field, text, &self.context) {
                None => trace!("{}: rule {} found no label", field, tier),
                Some(Err(e)) => trace!("{}: rule {} rejected: {}", field, tier, e),
                Some(Ok(normalized)) => {
                    let confidence = rule.confidence_for(&normalized);
                    debug!("{}: '{}' at {:.2}", field, normalized.value, confidence);
                    return Some(FieldExtraction::matched(
                        normalized.value,
                        confidence,
                        provenance,
                    ));
                }
            }
        }

        let scan = field_rules.window.as_ref()?;
        match scan.apply(field, text, &self.context) {
            Some(value) => {
                debug!("{}: '{}' from table scan at {:.2}", field, value, scan.confidence);
                Some(FieldExtraction::matched(value, scan.confidence, provenance))
            }
            None => {
                trace!("{}: table scan found no valid token", field);
                None
            }
        }
    }
}

impl Default for FieldExtractionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STATEMENT: &str = r#"
        ACME MORTGAGE SERVICING
        Loan Number: 0012345678
        Unpaid Principal Balance: $245,112.09
        Interest Rate (Until 06/2030): 4.125%
        Principal and Interest: $1,234.56
        Escrow Payment: $412.77
        Total Payment: $1,647.33
        Payment Due Date: 04/01/2025
        Maturity Date: January 1, 2052
    "#;

    fn engine() -> FieldExtractionEngine {
        FieldExtractionEngine::with_rules(statement_rules(), RuleContext::new(2026))
    }

    fn extract(text: &str) -> StatementFields {
        engine().extract(text, Provenance::PdfText)
    }

    #[test]
    fn test_full_statement() {
        let fields = extract(STATEMENT);

        assert_eq!(fields.principal_balance, FieldExtraction::matched("245112.09", 0.90, Provenance::PdfText));
        assert_eq!(fields.note_rate, FieldExtraction::matched("4.125", 0.90, Provenance::PdfText));
        assert_eq!(fields.scheduled_pi, FieldExtraction::matched("1234.56", 0.90, Provenance::PdfText));
        assert_eq!(fields.escrow, FieldExtraction::matched("412.77", 0.85, Provenance::PdfText));
        assert_eq!(fields.next_due_date, FieldExtraction::matched("2025-04-01", 0.90, Provenance::PdfText));
        assert_eq!(fields.maturity_date, FieldExtraction::matched("2052-01-01", 0.90, Provenance::PdfText));
    }

    #[test]
    fn test_no_text_gives_empty_sentinels() {
        let fields = engine().extract("", Provenance::OcrText);
        assert_eq!(fields, StatementFields::empty(Provenance::OcrText));
    }

    #[test]
    fn test_fields_are_independent() {
        let fields = extract("Escrow: 300.00\nMaturity Date: 01/15/2045");

        assert!(fields.principal_balance.is_empty());
        assert!(fields.scheduled_pi.is_empty());
        assert_eq!(fields.escrow.value, "300.00");
        assert_eq!(fields.maturity_date.value, "2045-01-15");
        assert_eq!(fields.matched_count(), 2);
    }

    #[test]
    fn test_scheduled_pi_falls_through_tiers() {
        // Tier 1 is a bare integer, tier 2 is out of range, tier 3 is accepted.
        let fields = extract("P&I: 1200\nMonthly Payment: $50.00\nAmount Due: $1,800.00");
        assert_eq!(fields.scheduled_pi.value, "1800.00");
        assert_eq!(fields.scheduled_pi.confidence, 0.65);
    }

    #[test]
    fn test_scheduled_pi_second_tier() {
        let fields = extract("Monthly Payment: $2,010.5");
        assert_eq!(fields.scheduled_pi.value, "2010.50");
        assert_eq!(fields.scheduled_pi.confidence, 0.80);
    }

    #[test]
    fn test_only_first_match_per_rule() {
        // The first "Amount Due" is rejected; the later valid one is never examined.
        let fields = extract("Amount Due: 0.00\nAmount Due: $1,500.00");
        assert!(fields.scheduled_pi.is_empty());
        assert_eq!(fields.scheduled_pi.confidence, 0.0);
    }

    #[test]
    fn test_note_rate_out_of_range_rejected() {
        let fields = extract("Interest Rate: 30%");
        assert!(fields.note_rate.is_empty());
    }

    #[test]
    fn test_note_rate_glyph_corrected() {
        let fields = extract("Interest Rate: §.5600%");
        assert_eq!(fields.note_rate.value, "5.5600");
        assert_eq!(fields.note_rate.confidence, 0.90);
    }

    #[test]
    fn test_note_rate_table_scan_after_rejected_label() {
        let text = "Interest Rate: 30%\nInterest Rates\n06/2023 3.7500%\n06/2024 4.2500%\n06/2025 4.2500%";
        let fields = extract(text);
        assert_eq!(fields.note_rate, FieldExtraction::matched("4.2500", 0.70, Provenance::PdfText));
    }

    #[test]
    fn test_note_rate_table_scan_all_unique() {
        let fields = extract("Interest Rates\n3.7500%  4.0000%  4.2500%");
        assert_eq!(fields.note_rate.value, "3.7500");
    }

    #[test]
    fn test_unparseable_date_kept_verbatim() {
        let fields = extract("Maturity Date: 13/45/2045");
        assert_eq!(fields.maturity_date, FieldExtraction::matched("13/45/2045", 0.50, Provenance::PdfText));
    }

    #[test]
    fn test_two_digit_maturity_year_after_2050() {
        let fields = extract("Maturity Date: 09/01/52");
        assert_eq!(fields.maturity_date, FieldExtraction::matched("2052-09-01", 0.90, Provenance::PdfText));

        let fields = extract("Maturity Date: 09/01/99");
        assert_eq!(fields.maturity_date.value, "1999-09-01");
    }

    #[test]
    fn test_reference_year_from_config() {
        let mut config = MortexConfig::default();
        config.extraction.reference_year = Some(1990);

        let fields = FieldExtractionEngine::from_config(&config)
            .extract("Maturity Date: 09/01/52", Provenance::PdfText);

        assert_eq!(fields.maturity_date.value, "1952-09-01");
    }

    #[test]
    fn test_textual_due_date() {
        let fields = extract("Next Payment Due: Sept 1, 2025");
        assert_eq!(fields.next_due_date.value, "2025-09-01");
    }

    #[test]
    fn test_confidence_invariants() {
        let fields = extract(STATEMENT);
        for (_, field) in fields.iter() {
            assert!((0.0..=1.0).contains(&field.confidence));
            if field.is_empty() {
                assert_eq!(field.confidence, 0.0);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(extract(STATEMENT), extract(STATEMENT));
    }
}
