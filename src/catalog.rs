//! Persisted people and documents.
//!
//! Row-level operations over the two tables plus the one composite effect
//! in the system: delete, which removes the stored file before committing
//! the row removal.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::models::{Document, Person};
use crate::storage::{self, FileRemoval};

/// Lowercase alphanumeric projection of a display name. Stored alongside
/// the display name; reserved for future de-duplication.
pub fn standardize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Fetches the person with this `unique_id`, creating them on first
/// reference. The insert is conflict-tolerant so a concurrent first upload
/// for the same person resolves to one row.
pub async fn get_or_create_person(
    pool: &SqlitePool,
    unique_id: &str,
    display_name: &str,
) -> Result<Person> {
    sqlx::query(
        r#"
        INSERT INTO people (id, unique_id, standard_name, display_name)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(unique_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(unique_id)
    .bind(standardize_name(display_name))
    .bind(display_name)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT id, unique_id, standard_name, display_name FROM people WHERE unique_id = ?",
    )
    .bind(unique_id)
    .fetch_one(pool)
    .await?;

    Ok(person_from_row(&row))
}

pub async fn filename_exists(pool: &SqlitePool, filename_on_disk: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE filename_on_disk = ?")
        .bind(filename_on_disk)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn insert_document(pool: &SqlitePool, doc: &Document) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, document_name, filename_on_disk, category, date_uploaded, description, person_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&doc.id)
    .bind(&doc.document_name)
    .bind(&doc.filename_on_disk)
    .bind(&doc.category)
    .bind(doc.date_uploaded)
    .bind(&doc.description)
    .bind(&doc.person_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolves a document and its owner in one query, `None` for unknown ids.
pub async fn document_with_owner(
    pool: &SqlitePool,
    doc_id: &str,
) -> Result<Option<(Document, Person)>> {
    let row = sqlx::query(
        r#"
        SELECT d.id, d.document_name, d.filename_on_disk, d.category, d.date_uploaded,
               d.description, d.person_id,
               p.id AS p_id, p.unique_id, p.standard_name, p.display_name
        FROM documents d
        JOIN people p ON p.id = d.person_id
        WHERE d.id = ?
        "#,
    )
    .bind(doc_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let doc = document_from_row(&row);
        let person = Person {
            id: row.get("p_id"),
            unique_id: row.get("unique_id"),
            standard_name: row.get("standard_name"),
            display_name: row.get("display_name"),
        };
        (doc, person)
    }))
}

/// Outcome of a successful delete.
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted { document_name: String },
    /// Row removed, but the file was already gone. Surfaced to the user as
    /// a warning rather than an error.
    DeletedFileMissing { document_name: String },
}

/// Deletes a document: file first, then the row.
///
/// An already-missing file downgrades to a warning and the row is still
/// removed. Any other removal failure returns before the database is
/// touched, leaving the row (and whatever is on disk) intact.
pub async fn delete_document(
    pool: &SqlitePool,
    storage_config: &StorageConfig,
    doc_id: &str,
) -> Result<DeleteOutcome> {
    let Some((doc, owner)) = document_with_owner(pool, doc_id).await? else {
        bail!("document not found: {}", doc_id);
    };

    let path = storage::document_path(storage_config, &owner.unique_id, &doc.filename_on_disk);
    let removal = storage::remove_file(&path).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(doc_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(document = %doc.document_name, id = %doc_id, "deleted document");

    match removal {
        FileRemoval::Removed => Ok(DeleteOutcome::Deleted {
            document_name: doc.document_name,
        }),
        FileRemoval::AlreadyMissing => {
            warn!(document = %doc.document_name, "file was already missing from disk");
            Ok(DeleteOutcome::DeletedFileMissing {
                document_name: doc.document_name,
            })
        }
    }
}

pub(crate) fn person_from_row(row: &sqlx::sqlite::SqliteRow) -> Person {
    Person {
        id: row.get("id"),
        unique_id: row.get("unique_id"),
        standard_name: row.get("standard_name"),
        display_name: row.get("display_name"),
    }
}

pub(crate) fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        document_name: row.get("document_name"),
        filename_on_disk: row.get("filename_on_disk"),
        category: row.get("category"),
        date_uploaded: row.get("date_uploaded"),
        description: row.get("description"),
        person_id: row.get("person_id"),
    }
}
