//! End-to-end statement extraction.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::acquisition::TextAcquisition;
use crate::assembler::ResultAssembler;
use crate::document::{Document, DocumentType};
use crate::error::Result;
use crate::extraction::FieldExtractionEngine;
use crate::models::config::MortexConfig;
use crate::models::statement::ExtractionResult;
use crate::ocr::{OcrBackend, TesseractCli};
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Mortgage statement extractor.
///
/// Immutable after construction; one instance can serve many documents,
/// including from several threads at once.
pub struct Extractor<B = TesseractCli, P = PdfExtractor> {
    backend: B,
    acquisition: TextAcquisition,
    engine: FieldExtractionEngine,
    assembler: ResultAssembler,
    _pdf: PhantomData<fn() -> P>,
}

impl Extractor {
    /// Extractor using the command-line OCR tools named in `config`.
    pub fn new(config: &MortexConfig) -> Self {
        Self::with_backend(config, TesseractCli::from_config(&config.ocr))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&MortexConfig::default())
    }
}

impl<B, P> Extractor<B, P>
where
    B: OcrBackend,
    P: PdfProcessor + Default,
{
    /// Extractor with a custom OCR backend.
    pub fn with_backend(config: &MortexConfig, backend: B) -> Self {
        Self {
            backend,
            acquisition: TextAcquisition::from_config(config),
            engine: FieldExtractionEngine::from_config(config),
            assembler: ResultAssembler::new(config.debug.clone()),
            _pdf: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract the six statement fields from `document`.
    ///
    /// Fails only if the document cannot be staged to a temporary directory.
    /// Unreadable content, OCR failures, and missing fields are reported in the
    /// debug record of a successful result.
    pub fn extract(&self, document: &Document) -> Result<ExtractionResult> {
        let start = Instant::now();
        let mut timings = BTreeMap::new();

        let staging = tempfile::Builder::new().prefix("mortex-").tempdir()?;
        let staged = staging
            .path()
            .join(format!("upload.{}", document.staging_extension()));
        std::fs::write(&staged, &document.data)?;
        debug!(
            "Staged {} bytes of {} at {}",
            document.data.len(),
            document.doc_type,
            staged.display()
        );

        let stage_start = Instant::now();
        let acquired = self
            .acquisition
            .acquire::<P, B>(&self.backend, document, &staged);
        timings.insert("acquisition".to_string(), elapsed_ms(stage_start));

        let fields = if acquired.text.trim().is_empty() {
            None
        } else {
            let stage_start = Instant::now();
            let fields = self.engine.extract(&acquired.text, acquired.provenance);
            timings.insert("extraction".to_string(), elapsed_ms(stage_start));
            Some(fields)
        };
        timings.insert("total".to_string(), elapsed_ms(start));

        let result = self.assembler.assemble(
            document.doc_type,
            self.acquisition.page(),
            acquired,
            fields,
            timings,
        );

        info!(
            "Extracted {}/6 fields from {} ({}) in {}ms",
            result.fields.matched_count(),
            document.doc_type,
            result.debug.text_stats.source,
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Read a file and extract from it.
    pub fn extract_file(&self, path: &Path, doc_type: DocumentType) -> Result<ExtractionResult> {
        let document = Document::from_path(path, doc_type)?;
        self.extract(&document)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
