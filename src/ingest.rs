//! Upload ingestion.
//!
//! Coordinates the full upload flow: validation, storage layout, the
//! description pipeline, catalog rows. Description failures shape the
//! stored description text, never the fate of the upload.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog;
use crate::config::Config;
use crate::describe;
use crate::models::Document;
use crate::storage;
use crate::summarize::Summarizer;

/// One incoming upload, as parsed from the request.
#[derive(Debug)]
pub struct Upload {
    pub unique_id: String,
    pub display_name: String,
    pub document_name: String,
    pub category: Option<String>,
    pub original_filename: String,
    pub data: Vec<u8>,
}

/// Stores the file, creates the person on first reference, derives the
/// description, and persists the document row. Returns the created row.
pub async fn ingest_upload(
    config: &Config,
    pool: &SqlitePool,
    summarizer: Option<&Summarizer>,
    upload: Upload,
) -> Result<Document> {
    let unique_id = upload.unique_id.trim();
    let display_name = upload.display_name.trim();
    let document_name = upload.document_name.trim();

    if unique_id.is_empty() {
        bail!("person unique_id must not be empty");
    }
    if storage::sanitize_filename(unique_id) != unique_id {
        bail!("person unique_id contains invalid characters: '{}'", unique_id);
    }
    if display_name.is_empty() {
        bail!("person display_name must not be empty");
    }
    if document_name.is_empty() {
        bail!("document_name must not be empty");
    }
    if upload.data.is_empty() {
        bail!("uploaded file must not be empty");
    }

    let extension = storage::file_extension(&upload.original_filename);
    if extension.is_empty() || !config.storage.is_allowed_extension(extension) {
        bail!("file type '.{}' is not allowed", extension.to_lowercase());
    }

    let filename_on_disk = storage::sanitize_filename(&upload.original_filename);
    if filename_on_disk.is_empty() {
        bail!("filename '{}' is invalid", upload.original_filename);
    }

    // Disk filenames are unique store-wide; the DB constraint is the
    // backstop, this pre-check keeps the error readable and avoids writing
    // the file first.
    if catalog::filename_exists(pool, &filename_on_disk).await? {
        bail!("a file named '{}' already exists in the store", filename_on_disk);
    }

    let person = catalog::get_or_create_person(pool, unique_id, display_name).await?;

    let path = storage::store_file(
        &config.storage,
        &person.unique_id,
        &filename_on_disk,
        &upload.data,
    )
    .await?;

    let outcome = describe::describe(summarizer, &path, &upload.original_filename).await;
    if outcome.is_placeholder() {
        info!(
            file = %upload.original_filename,
            outcome = ?outcome,
            "description pipeline did not produce a summary"
        );
    }

    let doc = Document {
        id: Uuid::new_v4().to_string(),
        document_name: document_name.to_string(),
        filename_on_disk,
        category: upload
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        date_uploaded: chrono::Utc::now().timestamp(),
        description: Some(outcome.into_description()),
        person_id: person.id.clone(),
    };

    if let Err(e) = catalog::insert_document(pool, &doc).await {
        // Best-effort: do not leave an unreferenced file behind.
        if let Err(cleanup) = storage::remove_file(&path).await {
            warn!(error = %cleanup, "failed to clean up file after insert error");
        }
        return Err(e);
    }

    info!(
        document = %doc.document_name,
        person = %person.unique_id,
        id = %doc.id,
        "stored document"
    );

    Ok(doc)
}
