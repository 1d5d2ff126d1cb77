//! Regex patterns for mortgage statement fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Principal balance
    pub static ref PRINCIPAL_BALANCE: Regex = Regex::new(
        r"(?i)(?:Principal\s+Balance|Unpaid\s+Principal\s+Balance|Principal\s+balance)[:\s]+\$?\s*([\d,]+\.?\d*)"
    ).unwrap();

    // Note rate, labeled. The label may carry a parenthetical such as "(Until 06/2030)".
    pub static ref NOTE_RATE: Regex = Regex::new(
        r"(?i)(?:Interest\s+Rate(?:\s*\(.*?\))?|Note\s+Rate(?:\s*\(.*?\))?|Current\s+Interest\s+Rate(?:\s*\(.*?\))?)[:\s]+([\d§S]+\.?\d*)\s*%?"
    ).unwrap();

    // Heading of a rate history table
    pub static ref RATE_TABLE_HEADING: Regex = Regex::new(
        r"(?i)Interest\s+Rates"
    ).unwrap();

    // Percent tokens inside a rate table (case-sensitive: only an upper-case S is a misread 5)
    pub static ref RATE_TOKEN: Regex = Regex::new(
        r"[\d§S]{1,2}\.\d{2,4}%"
    ).unwrap();

    // OCR glyph confusions of a leading 5
    pub static ref RATE_GLYPH_FRACTION: Regex = Regex::new(
        r"^[§S]\.(\d{3,4})%$"
    ).unwrap();

    pub static ref RATE_GLYPH_TWO_DIGIT: Regex = Regex::new(
        r"^[§S](\d)\.(\d{3,4})%$"
    ).unwrap();

    // Scheduled principal and interest, by tier
    pub static ref PI_LABELED: Regex = Regex::new(
        r"(?i)(?:Principal\s+and\s+Interest|P&I|P\s+and\s+I|Principal\s+&\s+Interest)[:\s]+(\$?[\d,]+\.?\d*)"
    ).unwrap();

    pub static ref PI_PAYMENT: Regex = Regex::new(
        r"(?i)(?:Monthly\s+Payment|Payment\s+Amount|Total\s+Payment)[:\s]+(\$?[\d,]+\.?\d*)"
    ).unwrap();

    pub static ref PI_AMOUNT_DUE: Regex = Regex::new(
        r"(?i)(?:Amount\s+Due)[:\s]+(\$?[\d,]+\.?\d*)"
    ).unwrap();

    // Escrow
    pub static ref ESCROW: Regex = Regex::new(
        r"(?i)(?:Escrow\s+Payment|Escrow)[:\s]+\$?\s*([\d,]+\.?\d*)"
    ).unwrap();

    // Labeled dates
    pub static ref NEXT_DUE_DATE: Regex = Regex::new(
        r"(?i)(?:Next\s+Payment\s+Due(?:\s*\(.*?\))?|Payment\s+Due\s+Date(?:\s*\(.*?\))?|Payment\s+Due(?:\s*\(.*?\))?)[:\s]+(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\w+\s+\d{1,2},?\s+\d{4})"
    ).unwrap();

    pub static ref MATURITY_DATE: Regex = Regex::new(
        r"(?i)(?:Maturity\s+Date|Payoff\s+Date)[:\s]+(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\w+\s+\d{1,2},?\s+\d{4})"
    ).unwrap();

    // Shapes of a captured date token
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$"
    ).unwrap();

    pub static ref DATE_TEXTUAL: Regex = Regex::new(
        r"^(\w+)\s+(\d{1,2}),?\s+(\d{4})$"
    ).unwrap();
}
