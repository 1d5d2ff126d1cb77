//! Final result assembly and debug record.

use std::collections::BTreeMap;

use crate::acquisition::AcquiredText;
use crate::document::DocumentType;
use crate::models::config::DebugConfig;
use crate::models::statement::{DebugInfo, ExtractionResult, StatementFields, TextStats};

/// Error recorded when acquisition produced only whitespace.
pub const NO_TEXT_ERROR: &str = "No text extracted from document";

/// Builds the six-field result and its debug record.
pub struct ResultAssembler {
    debug: DebugConfig,
}

impl ResultAssembler {
    pub fn new(debug: DebugConfig) -> Self {
        Self { debug }
    }

    /// Combine acquired text, extracted fields, and stage timings.
    ///
    /// `fields` is `None` when extraction was skipped; every field then becomes
    /// an empty sentinel with the document provenance. Timings are kept only when
    /// timing capture is enabled.
    pub fn assemble(
        &self,
        doc_type: DocumentType,
        page: u32,
        acquired: AcquiredText,
        fields: Option<StatementFields>,
        timings_ms: BTreeMap<String, u64>,
    ) -> ExtractionResult {
        let AcquiredText {
            text,
            provenance,
            warnings,
        } = acquired;

        let mut errors = warnings;
        if text.trim().is_empty() {
            errors.push(NO_TEXT_ERROR.to_string());
        }

        let text_sample: Option<String> = self
            .debug
            .include_text_sample
            .then(|| text.chars().take(self.debug.text_sample_chars).collect());

        ExtractionResult {
            fields: fields.unwrap_or_else(|| StatementFields::empty(provenance)),
            debug: DebugInfo {
                doc_type,
                pages_used: vec![page],
                timings_ms: if self.debug.record_timings {
                    timings_ms
                } else {
                    BTreeMap::new()
                },
                errors,
                text_stats: TextStats {
                    source: provenance,
                    chars: text.chars().count(),
                    lines: count_lines(&text),
                },
                text_sample,
            },
        }
    }
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(DebugConfig::default())
    }
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Number of lines, splitting on universal line boundaries.
///
/// `\r\n` is one boundary and a trailing boundary does not start a new line.
pub fn count_lines(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if is_line_boundary(c) {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            lines += 1;
            open = false;
        } else {
            open = true;
        }
    }

    if open { lines + 1 } else { lines }
}
