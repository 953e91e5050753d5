//! On-disk layout for uploaded files.
//!
//! Every person owns one directory under the configured upload root, named
//! by their sanitized `unique_id`; documents live directly inside it under
//! their sanitized `filename_on_disk`. Store-wide filename uniqueness is
//! enforced at the database layer.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::StorageConfig;

/// Reduces an untrusted name to a safe final path segment.
///
/// Takes the last path component, maps whitespace to `_`, drops every
/// character outside `[A-Za-z0-9._-]`, and strips leading dots. Returns an
/// empty string when nothing safe remains; callers must reject that.
pub fn sanitize_filename(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

/// Directory holding all of one person's files.
pub fn person_dir(storage: &StorageConfig, unique_id: &str) -> PathBuf {
    storage.upload_root.join(sanitize_filename(unique_id))
}

/// Full path for a document, from its owner's `unique_id` and its stored
/// disk filename. Upload, view, and delete all resolve through here.
pub fn document_path(storage: &StorageConfig, unique_id: &str, filename_on_disk: &str) -> PathBuf {
    person_dir(storage, unique_id).join(filename_on_disk)
}

/// Writes the uploaded bytes, creating the person directory first.
pub async fn store_file(
    storage: &StorageConfig,
    unique_id: &str,
    filename_on_disk: &str,
    data: &[u8],
) -> Result<PathBuf> {
    let dir = person_dir(storage, unique_id);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create upload directory: {}", dir.display()))?;

    let path = dir.join(filename_on_disk);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to write uploaded file: {}", path.display()))?;

    Ok(path)
}

/// Result of attempting to remove a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRemoval {
    Removed,
    /// The file was already gone. Non-fatal: delete continues with a warning.
    AlreadyMissing,
}

/// Removes a stored file, tolerating an already-missing file.
///
/// Any error other than not-found is returned and must abort the caller's
/// delete before the database row is touched.
pub async fn remove_file(path: &Path) -> Result<FileRemoval> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(FileRemoval::Removed),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "stored file already missing at delete time");
            Ok(FileRemoval::AlreadyMissing)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", path.display())),
    }
}

/// MIME type served for a stored filename, derived from its extension.
pub fn mime_for_filename(filename: &str) -> &'static str {
    match file_extension(filename).to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Extension of a filename without the dot, empty when there is none.
pub fn file_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}
