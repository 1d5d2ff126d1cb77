//! Text acquisition: native PDF text, OCR-layered PDF fallback, and image OCR.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::document::{Document, DocumentType};
use crate::models::config::MortexConfig;
use crate::models::statement::Provenance;
use crate::ocr::{ImageOcrEnsemble, OcrBackend};
use crate::pdf::PdfProcessor;

/// Text obtained for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredText {
    /// Raw text, possibly empty.
    pub text: String,
    /// How the text was obtained.
    pub provenance: Provenance,
    /// Failures absorbed on the way, in order.
    pub warnings: Vec<String>,
}

impl AcquiredText {
    fn new(text: String, provenance: Provenance) -> Self {
        Self {
            text,
            provenance,
            warnings: Vec::new(),
        }
    }
}

/// Chooses and runs the text acquisition path for a document.
///
/// Never fails: every error degrades to empty text with the path's default
/// provenance and a warning.
pub struct TextAcquisition {
    min_native_chars: usize,
    page: u32,
    ensemble: ImageOcrEnsemble,
}

impl TextAcquisition {
    pub fn new(min_native_chars: usize, page: u32, ensemble: ImageOcrEnsemble) -> Self {
        Self {
            min_native_chars,
            page,
            ensemble,
        }
    }

    pub fn from_config(config: &MortexConfig) -> Self {
        Self::new(
            config.acquisition.min_native_chars,
            config.acquisition.first_page,
            ImageOcrEnsemble::from_config(&config.ocr),
        )
    }

    /// Page whose text is used.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Acquire text for `document`, whose bytes are also staged at `staged`.
    ///
    /// The OCR-layered copy of a PDF is written next to `staged` and removed
    /// before returning.
    pub fn acquire<P, B>(&self, backend: &B, document: &Document, staged: &Path) -> AcquiredText
    where
        P: PdfProcessor + Default,
        B: OcrBackend + ?Sized,
    {
        match document.doc_type {
            DocumentType::Pdf => self.acquire_pdf::<P, B>(backend, &document.data, staged),
            DocumentType::Image => self.acquire_image(backend, &document.data),
        }
    }

    fn acquire_pdf<P, B>(&self, backend: &B, data: &[u8], staged: &Path) -> AcquiredText
    where
        P: PdfProcessor + Default,
        B: OcrBackend + ?Sized,
    {
        let mut result = match self.read_page::<P>(data) {
            Ok(text) => AcquiredText::new(text, Provenance::PdfText),
            Err(e) => {
                warn!("Native PDF text extraction failed: {}", e);
                let mut result = AcquiredText::new(String::new(), Provenance::PdfText);
                result.warnings.push(format!("PDF text extraction failed: {}", e));
                result
            }
        };

        let native_chars = result.text.trim().chars().count();
        if native_chars >= self.min_native_chars {
            debug!("Using native PDF text ({} chars)", native_chars);
            return result;
        }

        info!(
            "PDF has no/low text ({} chars). Running OCR text layer...",
            native_chars
        );
        match self.layered_text::<P, B>(backend, staged) {
            Ok(text) => {
                result.text = text;
                result.provenance = Provenance::OcrText;
            }
            Err(message) => {
                warn!("{}", message);
                result.warnings.push(message);
            }
        }
        result
    }

    /// Text of the configured page from an OCR-layered copy of `staged`.
    ///
    /// A failure to layer is an error; a failure to read the layered copy yields
    /// empty text, since the copy was produced.
    fn layered_text<P, B>(&self, backend: &B, staged: &Path) -> Result<String, String>
    where
        P: PdfProcessor + Default,
        B: OcrBackend + ?Sized,
    {
        let dir = staged.parent().unwrap_or_else(|| Path::new("."));
        let layered = tempfile::Builder::new()
            .prefix("layered-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(|e| format!("Failed to create OCR output file: {}", e))?;

        backend
            .add_text_layer(staged, layered.path())
            .map_err(|e| format!("OCR text layer failed: {}", e))?;

        let text = std::fs::read(layered.path())
            .map_err(|e| e.to_string())
            .and_then(|data| self.read_page::<P>(&data).map_err(|e| e.to_string()));

        Ok(match text {
            Ok(text) => {
                debug!("Read {} chars from OCR-layered PDF", text.chars().count());
                text
            }
            Err(e) => {
                warn!("Failed to read OCR-layered PDF: {}", e);
                String::new()
            }
        })
    }

    fn read_page<P: PdfProcessor + Default>(&self, data: &[u8]) -> crate::pdf::Result<String> {
        let mut processor = P::default();
        processor.load(data)?;
        processor.extract_page_text(self.page)
    }

    fn acquire_image<B: OcrBackend + ?Sized>(&self, backend: &B, data: &[u8]) -> AcquiredText {
        match self.ensemble.recognize(backend, data) {
            Ok(result) => AcquiredText::new(result.text, Provenance::OcrText),
            Err(e) => {
                warn!("Image OCR failed: {}", e);
                let mut result = AcquiredText::new(String::new(), Provenance::OcrText);
                result.warnings.push(format!("Image OCR failed: {}", e));
                result
            }
        }
    }
}

impl Default for TextAcquisition {
    fn default() -> Self {
        Self::from_config(&MortexConfig::default())
    }
}
