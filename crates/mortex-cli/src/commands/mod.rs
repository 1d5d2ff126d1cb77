//! CLI subcommands and shared helpers.

pub mod batch;
pub mod check;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};

use tracing::debug;

use mortex_core::{DocumentType, MortexConfig, UnsupportedDocument};

/// Content type used when neither the bytes nor the file name identify the file.
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mortex")
        .join("config.json")
}

/// Resolve the configuration file: the explicit path, else the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration from an explicit path, the default file if present, or defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<MortexConfig> {
    if let Some(path) = explicit {
        return Ok(MortexConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(MortexConfig::from_file(&path)?)
    } else {
        Ok(MortexConfig::default())
    }
}

/// Content type of a file: the declared one, else sniffed from its bytes, else
/// guessed from its extension.
pub fn detect_content_type(declared: Option<&str>, data: &[u8], path: &Path) -> String {
    declared
        .map(|s| s.to_string())
        .or_else(|| infer::get(data).map(|t| t.mime_type().to_string()))
        .or_else(|| mime_guess::from_path(path).first().map(|m| m.to_string()))
        .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string())
}

/// Classify a file for extraction.
pub fn classify(
    declared: Option<&str>,
    data: &[u8],
    path: &Path,
) -> Result<DocumentType, UnsupportedDocument> {
    let content_type = detect_content_type(declared, data, path);
    debug!("{}: content type {}", path.display(), content_type);
    DocumentType::from_content_type(&content_type)
}

/// Whether `EXTRACT_DEBUG` asks for the text sample.
pub fn debug_text_from_env() -> bool {
    std::env::var("EXTRACT_DEBUG").as_deref() == Ok("1")
}
