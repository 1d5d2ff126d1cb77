//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::MortexError;
use crate::ocr::ScoringPolicy;

/// Main configuration for the mortex pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortexConfig {
    /// Text acquisition configuration.
    pub acquisition: AcquisitionConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// OCR tool and preprocessing configuration.
    pub ocr: OcrConfig,

    /// Diagnostic output configuration.
    pub debug: DebugConfig,
}

/// Text acquisition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Native PDF text shorter than this (after trimming) triggers the OCR layer fallback.
    pub min_native_chars: usize,

    /// Page whose text is used (1-indexed).
    pub first_page: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_native_chars: 100,
            first_page: 1,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Year that two-digit years are resolved around, within 50 years either
    /// side. Unset means the current year.
    pub reference_year: Option<i32>,
}

/// OCR tool and preprocessing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path or name of the `tesseract` binary.
    pub tesseract_path: PathBuf,

    /// Path or name of the `ocrmypdf` binary.
    pub ocrmypdf_path: PathBuf,

    /// Recognition language.
    pub language: String,

    /// Tesseract engine mode (`--oem`).
    pub engine_mode: u8,

    /// Tesseract page segmentation mode (`--psm`). 6 = single uniform block of text.
    pub page_seg_mode: u8,

    /// Integer upscale factor applied before recognition.
    pub upscale: u32,

    /// Contrast boost of the enhanced pass.
    pub contrast_factor: f64,

    /// Median filter radius of the enhanced pass (1 = 3x3 window).
    pub median_radius: u32,

    /// Pass selection policy.
    pub scoring: ScoringPolicy,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            ocrmypdf_path: PathBuf::from("ocrmypdf"),
            language: "eng".to_string(),
            engine_mode: 1,
            page_seg_mode: 6,
            upscale: 2,
            contrast_factor: 1.8,
            median_radius: 1,
            scoring: ScoringPolicy::default(),
        }
    }
}

/// Diagnostic output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Include a leading sample of the acquired text in the debug record.
    pub include_text_sample: bool,

    /// Length of the text sample in characters.
    pub text_sample_chars: usize,

    /// Record wall-clock stage timings. Off by default so results stay reproducible.
    pub record_timings: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            include_text_sample: false,
            text_sample_chars: 300,
            record_timings: false,
        }
    }
}

impl MortexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, MortexError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| MortexError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), MortexError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| MortexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), MortexError> {
        if self.acquisition.first_page == 0 {
            return Err(MortexError::Config("acquisition.first_page is 1-indexed".to_string()));
        }
        if self.ocr.upscale == 0 {
            return Err(MortexError::Config("ocr.upscale must be at least 1".to_string()));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(MortexError::Config("ocr.language must not be empty".to_string()));
        }
        if self.ocr.scoring.length_divisor == 0 {
            return Err(MortexError::Config(
                "ocr.scoring.length_divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MortexConfig =
            serde_json::from_str(r#"{"debug": {"include_text_sample": true}}"#).unwrap();

        assert!(config.debug.include_text_sample);
        assert_eq!(config.debug.text_sample_chars, 300);
        assert_eq!(config.acquisition.min_native_chars, 100);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.scoring.keyword_weight, 50);
        assert_eq!(config.extraction.reference_year, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = MortexConfig::default();
        config.ocr.contrast_factor = 2.0;
        config.save(&path).unwrap();

        assert_eq!(MortexConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_zero_upscale() {
        let mut config = MortexConfig::default();
        config.ocr.upscale = 0;
        assert!(matches!(config.validate(), Err(MortexError::Config(_))));
    }
}
