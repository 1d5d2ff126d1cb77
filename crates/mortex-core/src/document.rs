//! Input documents and content-type classification.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content types accepted by the intake layer.
pub const ACCEPTED_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Declared type of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Image,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Image => "image",
        }
    }

    /// Classify a MIME content type.
    ///
    /// Anything mentioning "pdf" is a PDF; anything mentioning "image", "jpg",
    /// "jpeg" or "png" is an image. Everything else is rejected.
    pub fn from_content_type(content_type: &str) -> Result<Self, UnsupportedDocument> {
        let lower = content_type.to_lowercase();

        if lower.contains("pdf") {
            Ok(DocumentType::Pdf)
        } else if ["image", "jpg", "jpeg", "png"]
            .iter()
            .any(|kind| lower.contains(kind))
        {
            Ok(DocumentType::Image)
        } else {
            Err(UnsupportedDocument::new(content_type))
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured rejection for a document type the pipeline does not accept.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{error}: {content_type}")]
pub struct UnsupportedDocument {
    pub error: String,
    pub content_type: String,
    pub accepted_types: Vec<String>,
}

impl UnsupportedDocument {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            error: "Unsupported file type".to_string(),
            content_type: content_type.into(),
            accepted_types: ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A single statement to extract from. Lives for one request.
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw file content.
    pub data: Vec<u8>,
    /// Declared type.
    pub doc_type: DocumentType,
}

impl Document {
    pub fn new(data: Vec<u8>, doc_type: DocumentType) -> Self {
        Self { data, doc_type }
    }

    /// Read a document from disk.
    pub fn from_path(path: &Path, doc_type: DocumentType) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?, doc_type))
    }

    /// File extension used when staging the document for external tools.
    pub(crate) fn staging_extension(&self) -> &'static str {
        match self.doc_type {
            DocumentType::Pdf => "pdf",
            DocumentType::Image => "img",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_content_types() {
        assert_eq!(
            DocumentType::from_content_type("application/pdf"),
            Ok(DocumentType::Pdf)
        );
        assert_eq!(
            DocumentType::from_content_type("image/png"),
            Ok(DocumentType::Image)
        );
        assert_eq!(
            DocumentType::from_content_type("IMAGE/JPEG"),
            Ok(DocumentType::Image)
        );
        assert_eq!(
            DocumentType::from_content_type("application/x-jpg"),
            Ok(DocumentType::Image)
        );
    }

    #[test]
    fn test_reject_lists_accepted_types() {
        let rejection = DocumentType::from_content_type("text/plain").unwrap_err();

        assert_eq!(rejection.content_type, "text/plain");
        assert_eq!(
            rejection.accepted_types,
            vec!["application/pdf", "image/jpeg", "image/png"]
        );

        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["error"], "Unsupported file type");
    }
}
