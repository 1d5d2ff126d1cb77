//! Core library for mortgage statement extraction.
//!
//! This crate provides:
//! - Text acquisition from PDFs (native text layer, OCR-layered fallback)
//! - Dual-pass image OCR with automatic pass selection
//! - Rule-based extraction of six statement fields with confidence tiers
//! - A fixed-shape JSON result with a diagnostic record

pub mod acquisition;
pub mod assembler;
pub mod document;
pub mod error;
pub mod extraction;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use acquisition::{AcquiredText, TextAcquisition};
pub use assembler::ResultAssembler;
pub use document::{ACCEPTED_TYPES, Document, DocumentType, UnsupportedDocument};
pub use error::{ExtractionError, MortexError, OcrError, PdfError, Result};
pub use extraction::FieldExtractionEngine;
pub use models::config::MortexConfig;
pub use models::statement::{
    DebugInfo, ExtractionResult, FieldExtraction, FieldName, Provenance, StatementFields,
    TextStats,
};
pub use ocr::{ImageOcrEnsemble, OcrBackend, RecognitionMode, ScoringPolicy, TesseractCli};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::Extractor;
