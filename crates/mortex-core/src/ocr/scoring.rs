//! Recognition quality proxy used to choose between OCR passes.

use serde::{Deserialize, Serialize};

/// Hand-tuned scoring weights.
///
/// `score = digits + keyword_weight * keyword_hits + chars / length_divisor`.
/// Statement vocabulary should dominate the score; the exact weights are not
/// known to be optimal and can be replaced through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Points per keyword found.
    pub keyword_weight: u64,

    /// One point per this many characters.
    pub length_divisor: usize,

    /// Keywords matched case-insensitively as substrings. Each counts at most once.
    pub keywords: Vec<String>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            keyword_weight: 50,
            length_divisor: 200,
            keywords: [
                "LOAN", "PAYMENT", "BORROWER", "PRINCIPAL", "INTEREST", "RATE", "MATURITY",
                "ESCROW",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

impl ScoringPolicy {
    /// Score OCR output by digit count, keyword hits, and length.
    pub fn score(&self, text: &str) -> u64 {
        let digits = text.chars().filter(|c| c.is_numeric()).count() as u64;

        let upper = text.to_uppercase();
        let keyword_hits = self
            .keywords
            .iter()
            .filter(|kw| upper.contains(kw.to_uppercase().as_str()))
            .count() as u64;

        let length_bonus = (text.chars().count() / self.length_divisor.max(1)) as u64;

        digits + self.keyword_weight * keyword_hits + length_bonus
    }
}
