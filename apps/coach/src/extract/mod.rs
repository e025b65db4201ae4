//! Text Extractor: turns an uploaded resume into plain text.
//!
//! PDF goes through `pdf-extract`; plain-text uploads are decoded as UTF-8.
//! Any other format is rejected up front rather than guessed at.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported resume format '{0}' (upload a PDF or plain-text file)")]
    UnsupportedFormat(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Resume is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("No text could be extracted from the resume")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Detects the kind from the declared content type first, then the file extension.
    pub fn detect(filename: Option<&str>, content_type: Option<&str>) -> Result<Self, ExtractError> {
        let content_type = content_type.map(|c| c.to_ascii_lowercase());
        match content_type.as_deref() {
            Some("application/pdf") => return Ok(Self::Pdf),
            Some(ct) if ct.starts_with("text/plain") => return Ok(Self::PlainText),
            _ => {}
        }

        let extension = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") | Some("text") | Some("md") => Ok(Self::PlainText),
            _ => Err(ExtractError::UnsupportedFormat(
                content_type
                    .or_else(|| filename.map(String::from))
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
        }
    }
}

/// Extracts the resume text. Blank output counts as a failure: the workflow cannot
/// leave Intake without usable resume text.
pub fn extract_resume_text(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ExtractError> {
    let text = match DocumentKind::detect(filename, content_type)? {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        DocumentKind::PlainText => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidUtf8)?
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(text)
}
