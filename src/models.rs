//! Core data models used throughout dossier.
//!
//! These types represent the people and documents that flow through the
//! upload, description, and search paths.

/// A person record, created implicitly the first time an upload references
/// their `unique_id`.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Person {
    pub id: String,
    /// Stable external key supplied by the caller.
    pub unique_id: String,
    /// Lowercase alphanumeric projection of `display_name`. Stored but not
    /// used in lookups; reserved for future de-duplication.
    pub standard_name: String,
    pub display_name: String,
}

/// A stored document owned by exactly one person.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Document {
    pub id: String,
    /// Human-facing name shown in listings and downloads.
    pub document_name: String,
    /// Sanitized name of the file under the owner's upload directory.
    /// Unique across the whole store.
    pub filename_on_disk: String,
    pub category: Option<String>,
    /// Epoch seconds, server-assigned at creation.
    pub date_uploaded: i64,
    /// Set by the description pipeline; placeholder text on failure.
    pub description: Option<String>,
    pub person_id: String,
}

/// A person together with a document list, as returned by listing/search.
///
/// This is a detached projection: search filtering builds new values of this
/// type and never writes back to the stored relationship.
#[derive(Debug, Clone)]
pub struct PersonWithDocuments {
    pub person: Person,
    pub documents: Vec<Document>,
}
