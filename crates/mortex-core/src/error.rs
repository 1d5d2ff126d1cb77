//! Error types for the mortex-core library.

use thiserror::Error;

/// Main error type for the mortex library.
///
/// Only failures that cross the outer boundary of [`crate::Extractor`] reach the
/// caller as this type. Acquisition and parsing failures are absorbed into the
/// debug record of the result.
#[derive(Error, Debug)]
pub enum MortexError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing and the external recognition tools.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition or layering tool is not installed.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran but reported failure.
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// I/O error while staging OCR inputs or outputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a matched token into a field value.
///
/// These never leave the extraction engine: a failing rule is skipped and the
/// next rule is tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The captured token could not be parsed as a number or date.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// The value parsed but falls outside its sanity bound.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The captured token does not look like the expected kind of value.
    #[error("unexpected format for {field}: {value}")]
    Format { field: String, value: String },
}

/// Result type for the mortex library.
pub type Result<T> = std::result::Result<T, MortexError>;
