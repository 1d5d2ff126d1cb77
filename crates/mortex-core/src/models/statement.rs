//! Mortgage statement extraction output, serialized as the public JSON contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentType;

/// Which acquisition path produced the text backing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Native PDF text layer.
    PdfText,
    /// Optical character recognition (image OCR or OCR-layered PDF).
    OcrText,
    /// Reserved for a model-assisted extractor. Never produced by this crate.
    LlmFallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::PdfText => "pdf_text",
            Provenance::OcrText => "ocr_text",
            Provenance::LlmFallback => "llm_fallback",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six statement fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    PrincipalBalance,
    NoteRate,
    ScheduledPi,
    Escrow,
    NextDueDate,
    MaturityDate,
}

impl FieldName {
    /// All fields, in output order.
    pub const ALL: [FieldName; 6] = [
        FieldName::PrincipalBalance,
        FieldName::NoteRate,
        FieldName::ScheduledPi,
        FieldName::Escrow,
        FieldName::NextDueDate,
        FieldName::MaturityDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::PrincipalBalance => "principal_balance",
            FieldName::NoteRate => "note_rate",
            FieldName::ScheduledPi => "scheduled_pi",
            FieldName::Escrow => "escrow",
            FieldName::NextDueDate => "next_due_date",
            FieldName::MaturityDate => "maturity_date",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted value with its confidence and provenance.
///
/// Constructed only through [`FieldExtraction::matched`] and
/// [`FieldExtraction::empty`], which keep `confidence` within `[0, 1]` and
/// force `0.0` for empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExtraction {
    /// Normalized value, or an empty string when the field was not found.
    pub value: String,

    /// Heuristic certainty assigned by the matching rule tier (0.0 - 1.0).
    pub confidence: f32,

    /// Acquisition path of the underlying text.
    pub provenance: Provenance,
}

impl FieldExtraction {
    /// A validated match.
    pub fn matched(value: impl Into<String>, confidence: f32, provenance: Provenance) -> Self {
        let value = value.into();
        let confidence = if value.is_empty() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            value,
            confidence,
            provenance,
        }
    }

    /// The sentinel for a field with no validated match.
    pub fn empty(provenance: Provenance) -> Self {
        Self {
            value: String::new(),
            confidence: 0.0,
            provenance,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Fixed six-field output. Every instance has every key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementFields {
    pub principal_balance: FieldExtraction,
    pub note_rate: FieldExtraction,
    pub scheduled_pi: FieldExtraction,
    pub escrow: FieldExtraction,
    pub next_due_date: FieldExtraction,
    pub maturity_date: FieldExtraction,
}

impl StatementFields {
    /// All fields empty, tagged with the document-level provenance.
    pub fn empty(provenance: Provenance) -> Self {
        Self {
            principal_balance: FieldExtraction::empty(provenance),
            note_rate: FieldExtraction::empty(provenance),
            scheduled_pi: FieldExtraction::empty(provenance),
            escrow: FieldExtraction::empty(provenance),
            next_due_date: FieldExtraction::empty(provenance),
            maturity_date: FieldExtraction::empty(provenance),
        }
    }

    pub fn get(&self, name: FieldName) -> &FieldExtraction {
        match name {
            FieldName::PrincipalBalance => &self.principal_balance,
            FieldName::NoteRate => &self.note_rate,
            FieldName::ScheduledPi => &self.scheduled_pi,
            FieldName::Escrow => &self.escrow,
            FieldName::NextDueDate => &self.next_due_date,
            FieldName::MaturityDate => &self.maturity_date,
        }
    }

    pub(crate) fn set(&mut self, name: FieldName, extraction: FieldExtraction) {
        let slot = match name {
            FieldName::PrincipalBalance => &mut self.principal_balance,
            FieldName::NoteRate => &mut self.note_rate,
            FieldName::ScheduledPi => &mut self.scheduled_pi,
            FieldName::Escrow => &mut self.escrow,
            FieldName::NextDueDate => &mut self.next_due_date,
            FieldName::MaturityDate => &mut self.maturity_date,
        };
        *slot = extraction;
    }

    /// Iterate over `(name, extraction)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &FieldExtraction)> {
        FieldName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }

    /// Number of fields with a non-empty value.
    pub fn matched_count(&self) -> usize {
        self.iter().filter(|(_, f)| !f.is_empty()).count()
    }
}

/// Text statistics for OCR diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    /// Provenance of the acquired text.
    pub source: Provenance,
    /// Character count.
    pub chars: usize,
    /// Line count.
    pub lines: usize,
}

/// Diagnostic record attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Declared document type.
    pub doc_type: DocumentType,

    /// Pages that contributed text (1-indexed).
    pub pages_used: Vec<u32>,

    /// Stage timings in milliseconds.
    pub timings_ms: BTreeMap<String, u64>,

    /// Absorbed failures, in the order they occurred.
    pub errors: Vec<String>,

    /// Statistics of the acquired text.
    pub text_stats: TextStats,

    /// Leading characters of the acquired text, only when diagnostics are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_sample: Option<String>,
}

/// Complete output of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: StatementFields,
    pub debug: DebugInfo,
}
