//! Dual-pass image recognition with automatic pass selection.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{ImagePreprocessor, OcrBackend, RecognitionMode, ScoringPolicy};

/// Which preprocessing pass produced a recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrPass {
    /// Grayscale + upscale only.
    Base,
    /// Base plus autocontrast, contrast boost, denoise, and sharpen.
    Enhanced,
}

/// Outcome of running both passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleResult {
    /// Text of the selected pass.
    pub text: String,
    /// Selected pass.
    pub selected: OcrPass,
    /// Score of the base pass.
    pub base_score: u64,
    /// Score of the enhanced pass.
    pub enhanced_score: u64,
}

/// Runs a base and an enhanced recognition pass and keeps the better one.
pub struct ImageOcrEnsemble {
    preprocessor: ImagePreprocessor,
    scoring: ScoringPolicy,
}

impl ImageOcrEnsemble {
    pub fn new(preprocessor: ImagePreprocessor, scoring: ScoringPolicy) -> Self {
        Self {
            preprocessor,
            scoring,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            ImagePreprocessor::from_config(config),
            config.scoring.clone(),
        )
    }

    /// Decode `data`, preprocess, recognize twice, and select.
    ///
    /// Any failure in loading, preprocessing, or either recognition pass fails
    /// the whole ensemble.
    pub fn recognize<B: OcrBackend + ?Sized>(
        &self,
        backend: &B,
        data: &[u8],
    ) -> Result<EnsembleResult, OcrError> {
        let start = Instant::now();

        let image = self.preprocessor.load(data)?;
        let base = self.preprocessor.prepare_base(&image)?;
        let base_text = backend.recognize(&base, RecognitionMode::Block)?;

        let enhanced = self.preprocessor.enhance(&base);
        let enhanced_text = backend.recognize(&enhanced, RecognitionMode::BlockPreserveSpacing)?;

        let result = self.select(base_text, enhanced_text);
        info!(
            "OCR ensemble selected {:?} pass (base={}, enhanced={}) in {}ms",
            result.selected,
            result.base_score,
            result.enhanced_score,
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Keep the enhanced text only if it scores strictly higher.
    pub fn select(&self, base_text: String, enhanced_text: String) -> EnsembleResult {
        let base_score = self.scoring.score(&base_text);
        let enhanced_score = self.scoring.score(&enhanced_text);
        debug!(
            "Pass scores: base={} enhanced={}",
            base_score, enhanced_score
        );

        let (text, selected) = if enhanced_score > base_score {
            (enhanced_text, OcrPass::Enhanced)
        } else {
            (base_text, OcrPass::Base)
        };

        EnsembleResult {
            text,
            selected,
            base_score,
            enhanced_score,
        }
    }
}

impl Default for ImageOcrEnsemble {
    fn default() -> Self {
        Self::new(ImagePreprocessor::default(), ScoringPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Mutex;

    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use pretty_assertions::assert_eq;

    /// Returns fixed text per recognition mode and records the image sizes seen.
    struct CannedRecognizer {
        base: String,
        enhanced: String,
        seen: Mutex<Vec<(RecognitionMode, (u32, u32))>>,
    }

    impl CannedRecognizer {
        fn new(base: &str, enhanced: &str) -> Self {
            Self {
                base: base.to_string(),
                enhanced: enhanced.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl OcrBackend for CannedRecognizer {
        fn add_text_layer(&self, _input: &Path, _output: &Path) -> Result<(), OcrError> {
            Err(OcrError::ToolNotFound("ocrmypdf".to_string()))
        }

        fn recognize(&self, image: &GrayImage, mode: RecognitionMode) -> Result<String, OcrError> {
            self.seen.lock().unwrap().push((mode, image.dimensions()));
            Ok(match mode {
                RecognitionMode::Block => self.base.clone(),
                RecognitionMode::BlockPreserveSpacing => self.enhanced.clone(),
            })
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) * 16 % 256) as u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_tie_selects_base() {
        let ensemble = ImageOcrEnsemble::default();
        let result = ensemble.select("LOAN 12".to_string(), "loan 34".to_string());

        assert_eq!(result.base_score, result.enhanced_score);
        assert_eq!(result.selected, OcrPass::Base);
        assert_eq!(result.text, "LOAN 12");
    }

    #[test]
    fn test_enhanced_wins_on_strictly_higher_score() {
        let ensemble = ImageOcrEnsemble::default();
        let result = ensemble.select(
            "Payment 1200".to_string(),
            "Payment 1200 Escrow".to_string(),
        );

        assert_eq!(result.selected, OcrPass::Enhanced);
        assert_eq!(result.enhanced_score, result.base_score + 50);
    }

    #[test]
    fn test_keywords_outweigh_digits() {
        let ensemble = ImageOcrEnsemble::default();
        let result = ensemble.select("1234567890".to_string(), "Maturity Date".to_string());

        assert_eq!(result.selected, OcrPass::Enhanced);
    }

    #[test]
    fn test_recognize_runs_both_passes_on_upscaled_image() {
        let ensemble = ImageOcrEnsemble::default();
        let recognizer = CannedRecognizer::new("noise", "Principal Balance: $1,000.00");

        let result = ensemble.recognize(&recognizer, &png_bytes(8, 5)).unwrap();

        assert_eq!(result.selected, OcrPass::Enhanced);
        assert_eq!(result.text, "Principal Balance: $1,000.00");
        assert_eq!(
            *recognizer.seen.lock().unwrap(),
            vec![
                (RecognitionMode::Block, (16, 10)),
                (RecognitionMode::BlockPreserveSpacing, (16, 10)),
            ]
        );
    }

    #[test]
    fn test_recognize_fails_on_undecodable_bytes() {
        let ensemble = ImageOcrEnsemble::default();
        let recognizer = CannedRecognizer::new("a", "b");

        let result = ensemble.recognize(&recognizer, b"\x00\x01garbage");

        assert!(matches!(result, Err(OcrError::InvalidImage(_))));
        assert!(recognizer.seen.lock().unwrap().is_empty());
    }
}
