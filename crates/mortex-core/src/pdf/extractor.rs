//! PDF text extraction using lopdf and pdf-extract.

use std::panic::{AssertUnwindSafe, catch_unwind};

use lopdf::Document;
use tracing::debug;

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text layer reader using lopdf for structure and pdf-extract for text.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    fn pages_text(&self) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed content streams.
        catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
        }))
        .map_err(|_| PdfError::TextExtraction("text extraction panicked".to_string()))?
        .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Text of one page through lopdf, touching no other page.
    fn single_page_text(document: &Document, page: u32) -> Result<String> {
        catch_unwind(AssertUnwindSafe(|| document.extract_text(&[page])))
            .map_err(|_| PdfError::TextExtraction("page text extraction panicked".to_string()))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Save decrypted document to raw_data for pdf_extract
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let Some(document) = self.document.as_ref() else {
            return Err(PdfError::Parse("No document loaded".to_string()));
        };
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        let index = (page - 1) as usize;
        let text = match self.pages_text() {
            Ok(mut pages) if index < pages.len() => pages.swap_remove(index),
            Ok(pages) => {
                debug!(
                    "pdf-extract returned {} pages, reading page {} alone",
                    pages.len(),
                    page
                );
                Self::single_page_text(document, page)?
            }
            Err(e) => {
                debug!("Whole-document text failed ({}), reading page {} alone", e, page);
                Self::single_page_text(document, page)?
            }
        };

        debug!("Extracted {} chars from page {}", text.len(), page);
        Ok(text)
    }
}
