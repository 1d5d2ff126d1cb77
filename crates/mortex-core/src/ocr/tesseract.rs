//! Command-line Tesseract and OCRmyPDF backend.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{GrayImage, ImageFormat};
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrBackend, RecognitionMode};

/// Recognition through the `tesseract` binary and PDF text layering through `ocrmypdf`.
pub struct TesseractCli {
    tesseract: PathBuf,
    ocrmypdf: PathBuf,
    language: String,
    engine_mode: u8,
    page_seg_mode: u8,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            tesseract: config.tesseract_path.clone(),
            ocrmypdf: config.ocrmypdf_path.clone(),
            language: config.language.clone(),
            engine_mode: config.engine_mode,
            page_seg_mode: config.page_seg_mode,
        }
    }

    /// Resolved locations of both tools, `None` where a tool is missing.
    pub fn tool_paths(&self) -> Vec<(&'static str, Option<PathBuf>)> {
        vec![
            ("tesseract", which::which(&self.tesseract).ok()),
            ("ocrmypdf", which::which(&self.ocrmypdf).ok()),
        ]
    }

    /// Arguments passed to tesseract after the input path.
    fn recognition_args(&self, mode: RecognitionMode) -> Vec<String> {
        let mut args = vec![
            "stdout".to_string(),
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_seg_mode.to_string(),
            "-l".to_string(),
            self.language.clone(),
        ];
        if mode == RecognitionMode::BlockPreserveSpacing {
            args.push("-c".to_string());
            args.push("preserve_interword_spaces=1".to_string());
        }
        args
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractCli {
    fn add_text_layer(&self, input: &Path, output: &Path) -> Result<(), OcrError> {
        debug!("Adding text layer: {} -> {}", input.display(), output.display());
        let args: Vec<OsString> = vec![
            "-l".into(),
            self.language.clone().into(),
            input.as_os_str().to_owned(),
            output.as_os_str().to_owned(),
        ];
        run_tool(&self.ocrmypdf, &args).map(|_| ())
    }

    fn recognize(&self, image: &GrayImage, mode: RecognitionMode) -> Result<String, OcrError> {
        let staged = tempfile::Builder::new()
            .prefix("mortex-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(staged.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Preprocessing(format!("failed to stage image: {}", e)))?;

        let mut args: Vec<OsString> = vec![staged.path().as_os_str().to_owned()];
        args.extend(self.recognition_args(mode).into_iter().map(OsString::from));

        let output = run_tool(&self.tesseract, &args)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Run an external tool, mapping a missing binary and a non-zero exit to [`OcrError`].
fn run_tool(program: &Path, args: &[OsString]) -> Result<Output, OcrError> {
    let tool = program.display().to_string();
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => Ok(output),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} exited with {}: {}", tool, output.status, stderr);
            Err(OcrError::ToolFailed {
                tool,
                message: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::ToolNotFound(tool)),
        Err(e) => Err(OcrError::Io(e)),
    }
}
