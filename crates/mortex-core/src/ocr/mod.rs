//! OCR capability, image preprocessing, and the dual-pass recognition ensemble.

mod ensemble;
mod preprocessing;
mod scoring;
mod tesseract;

pub use ensemble::{EnsembleResult, ImageOcrEnsemble, OcrPass};
pub use preprocessing::{ImagePreprocessor, apply_orientation, read_exif_orientation};
pub use scoring::ScoringPolicy;
pub use tesseract::TesseractCli;

use std::path::Path;

use image::GrayImage;

use crate::error::OcrError;

/// Layout handling requested from the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Treat the image as a single uniform block of text.
    Block,
    /// Single uniform block, keeping runs of spaces between words.
    BlockPreserveSpacing,
}

/// The two operations the pipeline needs from an OCR installation.
pub trait OcrBackend: Send + Sync {
    /// Write a copy of the PDF at `input` with a searchable text layer to `output`.
    fn add_text_layer(&self, input: &Path, output: &Path) -> Result<(), OcrError>;

    /// Recognize text in a preprocessed grayscale image.
    fn recognize(&self, image: &GrayImage, mode: RecognitionMode) -> Result<String, OcrError>;
}
