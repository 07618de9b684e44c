// Document types and text extraction
// OCR and office formats are handled outside this crate; plain text and CSV are read directly

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::{DocQaError, Result};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp", "ico", "heic", "heif", "svg",
    "raw", "arw", "cr2", "nef", "orf", "sr2",
];

/// Source format of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Excel,
    Csv,
    Txt,
    Docx,
    Image,
}

impl DocumentType {
    /// Map a file extension (without the dot, any case) to a document type
    #[inline]
    pub fn from_extension(extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "xlsx" | "xls" => Ok(Self::Excel),
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            "docx" => Ok(Self::Docx),
            ext if IMAGE_EXTENSIONS.contains(&ext) => Ok(Self::Image),
            _ => Err(DocQaError::UnsupportedFormat(extension)),
        }
    }

    #[inline]
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| DocQaError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(extension)
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "excel",
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Image => "image",
        }
    }

    /// Whether [`extract_text`] can read this type without an external extractor
    #[inline]
    pub fn is_plain_text(self) -> bool {
        matches!(self, Self::Txt | Self::Csv)
    }
}

impl fmt::Display for DocumentType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = DocQaError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "excel" => Ok(Self::Excel),
            "image" => Ok(Self::Image),
            other => Self::from_extension(other),
        }
    }
}

/// Read the raw text of a document.
///
/// Plain text and CSV are read as-is, with invalid UTF-8 replaced. Every other
/// format needs an external extractor and fails with `UnsupportedFormat`.
#[inline]
pub fn extract_text(path: &Path, doc_type: DocumentType) -> Result<String> {
    if !doc_type.is_plain_text() {
        warn!(
            "No extractor available for {} documents ({})",
            doc_type,
            path.display()
        );
        return Err(DocQaError::UnsupportedFormat(format!(
            "{} (extract the text first and load it as .txt)",
            doc_type
        )));
    }

    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    debug!(
        "Extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Detect the type from the file extension, then extract
#[inline]
pub fn load_document(path: &Path) -> Result<(String, DocumentType)> {
    let doc_type = DocumentType::from_path(path)?;
    let text = extract_text(path, doc_type)?;
    Ok((text, doc_type))
}
