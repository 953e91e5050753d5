//! External summarization client.
//!
//! One best-effort call per document to the Gemini `generateContent`
//! endpoint: fixed system instruction in, short description out. No
//! streaming, no multi-turn context, no retries; the request is bounded by
//! the configured timeout so a hung service cannot pin an upload forever.

use anyhow::Result;
use std::time::Duration;
use tracing::warn;

use crate::config::SummarizerConfig;

/// Hard cap on the text sent to the service, in characters.
pub const MAX_PROMPT_CHARS: usize = 30_000;
/// Hard cap on the stored description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 65_535;

const SYSTEM_INSTRUCTION: &str = "You are an expert document summarization assistant. Analyze the text provided \
     and generate a single, concise description (max 2 sentences) that highlights the \
     most important details, such as the document's type, purpose, dates, or key entities. \
     The description will be used as metadata in a document management system. Be brief and professional.";

/// Summarization failure, reported as text to the description pipeline.
#[derive(Debug)]
pub enum SummarizeError {
    /// The service answered with a non-success status.
    Api(String),
    /// Anything else: network failure, malformed response body.
    Other(String),
}

impl std::fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummarizeError::Api(e) => write!(f, "API error: {}", e),
            SummarizeError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SummarizeError {}

/// Handle to the external text-generation service.
pub struct Summarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Summarizer {
    /// Builds the summarizer described by config, or `None` when it is
    /// disabled or the API key is absent. A missing key is a warning, not a
    /// startup failure: the service keeps running and every description
    /// becomes a placeholder.
    pub fn from_config(config: &SummarizerConfig) -> Result<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }

        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                let summarizer =
                    Self::new(key, config.model.clone(), config.timeout_secs)?;
                Ok(Some(summarizer))
            }
            _ => {
                warn!("GEMINI_API_KEY not set; document descriptions will be unavailable");
                Ok(None)
            }
        }
    }

    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Issues exactly one summarization request for `text`.
    ///
    /// The input is truncated to [`MAX_PROMPT_CHARS`] before sending; the
    /// returned description is trimmed and truncated to
    /// [`MAX_DESCRIPTION_CHARS`].
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "system_instruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "parts": [
                    { "text": "Please summarize the following document text:" },
                    { "text": truncate_chars(text, MAX_PROMPT_CHARS) },
                ]
            }],
        });

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Api(format!("{}: {}", status, body_text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SummarizeError::Other(e.to_string()))?;

        let summary = parse_generate_response(&json)?;
        Ok(truncate_chars(summary.trim(), MAX_DESCRIPTION_CHARS).to_string())
    }
}

/// Pulls the generated text out of a `generateContent` response.
///
/// Concatenates every part of the first candidate; an empty or missing
/// candidate list is an unexpected-shape failure.
fn parse_generate_response(json: &serde_json::Value) -> Result<String, SummarizeError> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            SummarizeError::Other("Invalid response: missing candidates".to_string())
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    Ok(text)
}

/// Truncates to at most `max` characters, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
