//! Local text extraction for uploaded documents.
//!
//! Dispatches on the original file extension: structured text for PDF,
//! Tesseract OCR for raster images. Everything else is reported as
//! unsupported without opening the file. Failures are returned as typed
//! errors; the description pipeline turns them into placeholder text.

use std::path::Path;

/// Extensions handled by OCR.
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Extraction error. Never panics; the pipeline absorbs every variant.
#[derive(Debug)]
pub enum ExtractError {
    Unsupported(String),
    Pdf(String),
    Ocr(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Unsupported(ext) => {
                write!(f, "unsupported file type: '.{}'", ext)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ocr(e) => write!(f, "OCR failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from the file at `path`.
///
/// The extension is matched case-insensitively. A PDF page without text
/// contributes nothing; whether the overall result is usable is the
/// caller's call (empty output is not an error here).
pub fn extract_text(path: &Path, extension: &str) -> Result<String, ExtractError> {
    let ext = extension.to_ascii_lowercase();
    if ext == "pdf" {
        extract_pdf(path)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        extract_image(path)
    } else {
        Err(ExtractError::Unsupported(ext))
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(feature = "ocr")]
fn extract_image(path: &Path) -> Result<String, ExtractError> {
    let mut tess = tesseract::Tesseract::new(None, Some("eng"))
        .map_err(|e| ExtractError::Ocr(e.to_string()))?
        .set_image(&path.to_string_lossy())
        .map_err(|e| ExtractError::Ocr(e.to_string()))?;
    tess.get_text().map_err(|e| ExtractError::Ocr(e.to_string()))
}

#[cfg(not(feature = "ocr"))]
fn extract_image(_path: &Path) -> Result<String, ExtractError> {
    Err(ExtractError::Ocr(
        "OCR support not compiled in (rebuild with --features ocr)".to_string(),
    ))
}
