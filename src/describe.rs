//! Document description pipeline.
//!
//! Orchestrates extraction and summarization for a freshly stored file and
//! never fails: every failure mode collapses into a [`DescribeOutcome`]
//! variant, rendered to the stored description string by
//! [`DescribeOutcome::into_description`]. The caller persists that string;
//! nothing here touches the database.

use std::path::Path;

use crate::extract::{self, ExtractError};
use crate::summarize::{SummarizeError, Summarizer};

/// Outcome of one description attempt for one document.
#[derive(Debug)]
pub enum DescribeOutcome {
    /// The service produced a description.
    Described(String),
    /// No summarizer is configured; extraction was not attempted.
    ClientUnavailable,
    /// Extension outside the extractable set; the file was never opened.
    UnsupportedType(String),
    /// Extraction succeeded but produced only whitespace.
    NoReadableText,
    /// The PDF parser or OCR engine failed.
    ExtractionFailed(String),
    /// The external service answered with an error.
    ServiceError(String),
    /// Network or response-shape failure.
    UnexpectedError(String),
}

impl DescribeOutcome {
    /// Renders the string stored as the document description. Placeholder
    /// wording for the non-success paths is part of the stored data format,
    /// so it lives here and nowhere else.
    pub fn into_description(self) -> String {
        match self {
            DescribeOutcome::Described(text) => text,
            DescribeOutcome::ClientUnavailable => {
                "[AI FAILED]: API client not initialized. Check GEMINI_API_KEY setup.".to_string()
            }
            DescribeOutcome::UnsupportedType(ext) => {
                format!("[AI Skipped]: File type '.{}' is not supported.", ext)
            }
            DescribeOutcome::NoReadableText => {
                "[AI Skipped]: Document/Image contained no readable text.".to_string()
            }
            DescribeOutcome::ExtractionFailed(detail) => {
                format!("[AI Error]: Could not extract text locally: {}", detail)
            }
            DescribeOutcome::ServiceError(detail) => {
                format!("[AI Error]: Summarization API call failed. Detail: {}", detail)
            }
            DescribeOutcome::UnexpectedError(detail) => {
                format!(
                    "[AI Error]: An unexpected error occurred during summary generation: {}",
                    detail
                )
            }
        }
    }

    /// True for every variant except a generated description.
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, DescribeOutcome::Described(_))
    }
}

/// Runs the pipeline for the stored file at `path`.
///
/// The extension comes from the original upload filename, not the on-disk
/// name. Extraction is CPU-bound (PDF parse or OCR) and runs on the
/// blocking pool; the single summarization call is awaited inline.
pub async fn describe(
    summarizer: Option<&Summarizer>,
    path: &Path,
    original_filename: &str,
) -> DescribeOutcome {
    let Some(summarizer) = summarizer else {
        return DescribeOutcome::ClientUnavailable;
    };

    let extension = crate::storage::file_extension(original_filename).to_string();
    let path_buf = path.to_path_buf();

    let extracted =
        match tokio::task::spawn_blocking(move || extract::extract_text(&path_buf, &extension))
            .await
        {
            Ok(result) => result,
            Err(e) => return DescribeOutcome::UnexpectedError(e.to_string()),
        };

    let text = match extracted {
        Ok(text) => text,
        Err(ExtractError::Unsupported(ext)) => return DescribeOutcome::UnsupportedType(ext),
        Err(e @ (ExtractError::Pdf(_) | ExtractError::Ocr(_))) => {
            return DescribeOutcome::ExtractionFailed(e.to_string())
        }
    };

    if text.trim().is_empty() {
        return DescribeOutcome::NoReadableText;
    }

    match summarizer.summarize(&text).await {
        Ok(description) => DescribeOutcome::Described(description),
        Err(SummarizeError::Api(detail)) => DescribeOutcome::ServiceError(detail),
        Err(SummarizeError::Other(detail)) => DescribeOutcome::UnexpectedError(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_summarizer() -> Summarizer {
        // Never reaches the network in these tests; every path below
        // short-circuits before the summarization call.
        Summarizer::new("test-key".to_string(), "gemini-2.5-flash".to_string(), 5).unwrap()
    }

    #[tokio::test]
    async fn no_client_short_circuits_before_extraction() {
        // The path does not exist; with no summarizer configured it must
        // never be opened.
        let outcome = describe(None, Path::new("/nonexistent/file.pdf"), "file.pdf").await;
        assert!(matches!(outcome, DescribeOutcome::ClientUnavailable));
    }

    #[tokio::test]
    async fn unsupported_extension_is_skipped_without_io() {
        let summarizer = test_summarizer();
        let outcome = describe(
            Some(&summarizer),
            Path::new("/nonexistent/notes.txt"),
            "notes.txt",
        )
        .await;
        assert!(matches!(outcome, DescribeOutcome::UnsupportedType(ref e) if e == "txt"));
    }

    #[tokio::test]
    async fn missing_extension_is_skipped() {
        let summarizer = test_summarizer();
        let outcome = describe(Some(&summarizer), Path::new("/nonexistent/notes"), "notes").await;
        assert!(matches!(outcome, DescribeOutcome::UnsupportedType(ref e) if e.is_empty()));
    }

    #[tokio::test]
    async fn corrupt_pdf_reports_extraction_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let summarizer = test_summarizer();
        let outcome = describe(Some(&summarizer), &path, "bad.pdf").await;
        assert!(matches!(outcome, DescribeOutcome::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn extension_comes_from_original_filename() {
        // Stored under a neutral name, described via the original .docx name.
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("stored.bin");
        std::fs::write(&path, b"anything").unwrap();

        let summarizer = test_summarizer();
        let outcome = describe(Some(&summarizer), &path, "quarterly report.docx").await;
        assert!(matches!(outcome, DescribeOutcome::UnsupportedType(ref e) if e == "docx"));
    }

    #[test]
    fn placeholder_rendering() {
        assert_eq!(
            DescribeOutcome::ClientUnavailable.into_description(),
            "[AI FAILED]: API client not initialized. Check GEMINI_API_KEY setup."
        );
        assert_eq!(
            DescribeOutcome::UnsupportedType("txt".to_string()).into_description(),
            "[AI Skipped]: File type '.txt' is not supported."
        );
        assert_eq!(
            DescribeOutcome::NoReadableText.into_description(),
            "[AI Skipped]: Document/Image contained no readable text."
        );
        assert!(DescribeOutcome::ExtractionFailed("boom".to_string())
            .into_description()
            .starts_with("[AI Error]: "));
        assert!(DescribeOutcome::ServiceError("429".to_string())
            .into_description()
            .starts_with("[AI Error]: "));
        assert_eq!(
            DescribeOutcome::Described("A signed lease.".to_string()).into_description(),
            "A signed lease."
        );
    }

    #[test]
    fn only_success_is_not_a_placeholder() {
        assert!(!DescribeOutcome::Described("x".to_string()).is_placeholder());
        assert!(DescribeOutcome::NoReadableText.is_placeholder());
        assert!(DescribeOutcome::ClientUnavailable.is_placeholder());
    }
}
