//! Integration tests for the upload, search, and delete flows.
//!
//! Each test runs against its own temp directory: a TOML config, a fresh
//! SQLite file, and an upload root. No test touches the network; the
//! summarizer stays unconfigured throughout (per-format extraction is
//! covered in `tests/extraction.rs`).

use std::fs;
use std::path::PathBuf;

use sqlx::SqlitePool;
use tempfile::TempDir;

use dossier::config::{load_config, Config};
use dossier::ingest::{ingest_upload, Upload};
use dossier::{catalog, db, migrate, search, storage};

async fn setup() -> (TempDir, Config, SqlitePool) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_content = format!(
        r#"[db]
path = "{}/data/dossier.sqlite"

[storage]
upload_root = "{}/uploads"
"#,
        root.display(),
        root.display()
    );

    let config_path = root.join("dossier.toml");
    fs::write(&config_path, config_content).unwrap();

    let config = load_config(&config_path).unwrap();
    let pool = db::connect(&config).await.unwrap();
    migrate::apply(&pool).await.unwrap();

    (tmp, config, pool)
}

fn upload_for(filename: &str, data: &[u8]) -> Upload {
    Upload {
        unique_id: "P-001".to_string(),
        display_name: "Alice Archer".to_string(),
        document_name: "Test Document".to_string(),
        category: Some("general".to_string()),
        original_filename: filename.to_string(),
        data: data.to_vec(),
    }
}

fn stored_path(config: &Config, unique_id: &str, filename_on_disk: &str) -> PathBuf {
    storage::document_path(&config.storage, unique_id, filename_on_disk)
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (_tmp, config, pool) = setup().await;
    // Once in setup, twice more here.
    migrate::apply(&pool).await.unwrap();
    migrate::run_migrations(&config).await.unwrap();
}

#[tokio::test]
async fn upload_without_summarizer_stores_unavailable_placeholder() {
    let (_tmp, config, pool) = setup().await;

    let doc = ingest_upload(&config, &pool, None, upload_for("notes.txt", b"hello"))
        .await
        .unwrap();

    assert_eq!(
        doc.description.as_deref(),
        Some("[AI FAILED]: API client not initialized. Check GEMINI_API_KEY setup.")
    );
    // The file landed under the person's directory despite the placeholder.
    assert!(stored_path(&config, "P-001", &doc.filename_on_disk).exists());
}

#[tokio::test]
async fn upload_sanitizes_filename() {
    let (_tmp, config, pool) = setup().await;

    let doc = ingest_upload(
        &config,
        &pool,
        None,
        upload_for("../../../etc/my notes.txt", b"data"),
    )
    .await
    .unwrap();

    assert_eq!(doc.filename_on_disk, "my_notes.txt");
    let path = stored_path(&config, "P-001", &doc.filename_on_disk);
    assert!(path.exists());
    assert!(path.starts_with(&config.storage.upload_root));
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let (_tmp, config, pool) = setup().await;

    let err = ingest_upload(&config, &pool, None, upload_for("payload.exe", b"MZ"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not allowed"));
}

#[tokio::test]
async fn unsafe_unique_id_is_rejected() {
    let (_tmp, config, pool) = setup().await;

    let mut upload = upload_for("notes.txt", b"data");
    upload.unique_id = "../escape".to_string();

    let err = ingest_upload(&config, &pool, None, upload).await.unwrap_err();
    assert!(err.to_string().contains("invalid"));
}

#[tokio::test]
async fn duplicate_disk_filename_is_rejected_across_people() {
    let (_tmp, config, pool) = setup().await;

    ingest_upload(&config, &pool, None, upload_for("shared.txt", b"first"))
        .await
        .unwrap();

    let mut second = upload_for("shared.txt", b"second");
    second.unique_id = "P-002".to_string();
    second.display_name = "Bob Breaker".to_string();

    let err = ingest_upload(&config, &pool, None, second).await.unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn repeated_unique_id_reuses_one_person_row() {
    let (_tmp, config, pool) = setup().await;

    ingest_upload(&config, &pool, None, upload_for("first.txt", b"one"))
        .await
        .unwrap();
    let mut second = upload_for("second.txt", b"two");
    second.document_name = "Second Document".to_string();
    ingest_upload(&config, &pool, None, second).await.unwrap();

    let listing = search::list_people(&pool).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].person.unique_id, "P-001");
    assert_eq!(listing[0].documents.len(), 2);
    // Upload order, even within the same second.
    assert_eq!(listing[0].documents[0].filename_on_disk, "first.txt");
    assert_eq!(listing[0].documents[1].filename_on_disk, "second.txt");
}

#[tokio::test]
async fn delete_removes_file_and_row() {
    let (_tmp, config, pool) = setup().await;

    let doc = ingest_upload(&config, &pool, None, upload_for("doomed.txt", b"bye"))
        .await
        .unwrap();
    let path = stored_path(&config, "P-001", &doc.filename_on_disk);
    assert!(path.exists());

    let outcome = catalog::delete_document(&pool, &config.storage, &doc.id)
        .await
        .unwrap();
    assert!(matches!(outcome, catalog::DeleteOutcome::Deleted { .. }));
    assert!(!path.exists());
    assert!(catalog::document_with_owner(&pool, &doc.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_with_missing_file_warns_but_removes_row() {
    let (_tmp, config, pool) = setup().await;

    let doc = ingest_upload(&config, &pool, None, upload_for("ghost.txt", b"boo"))
        .await
        .unwrap();
    let path = stored_path(&config, "P-001", &doc.filename_on_disk);
    fs::remove_file(&path).unwrap();

    let outcome = catalog::delete_document(&pool, &config.storage, &doc.id)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        catalog::DeleteOutcome::DeletedFileMissing { .. }
    ));
    assert!(catalog::document_with_owner(&pool, &doc.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_unknown_id_errors_and_leaves_store_alone() {
    let (_tmp, config, pool) = setup().await;

    ingest_upload(&config, &pool, None, upload_for("keep.txt", b"keep"))
        .await
        .unwrap();

    let err = catalog::delete_document(&pool, &config.storage, "no-such-id")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));

    let listing = search::list_people(&pool).await.unwrap();
    assert_eq!(listing[0].documents.len(), 1);
}

#[tokio::test]
async fn deleted_document_is_distinct_from_orphaned_document() {
    let (_tmp, config, pool) = setup().await;

    let deleted = ingest_upload(&config, &pool, None, upload_for("a.txt", b"a"))
        .await
        .unwrap();
    let orphaned = {
        let mut upload = upload_for("b.txt", b"b");
        upload.document_name = "Orphan".to_string();
        ingest_upload(&config, &pool, None, upload).await.unwrap()
    };

    catalog::delete_document(&pool, &config.storage, &deleted.id)
        .await
        .unwrap();
    fs::remove_file(stored_path(&config, "P-001", &orphaned.filename_on_disk)).unwrap();

    // Deleted: no row at all. Orphaned: row resolves, file is gone.
    assert!(catalog::document_with_owner(&pool, &deleted.id)
        .await
        .unwrap()
        .is_none());
    let resolved = catalog::document_with_owner(&pool, &orphaned.id)
        .await
        .unwrap();
    let (doc, owner) = resolved.expect("orphaned document row must still resolve");
    assert!(!stored_path(&config, &owner.unique_id, &doc.filename_on_disk).exists());
}

#[tokio::test]
async fn search_with_category_only_match_attaches_only_that_document() {
    let (_tmp, config, pool) = setup().await;

    let mut invoice = upload_for("invoice.txt", b"one");
    invoice.document_name = "October Invoice".to_string();
    invoice.category = Some("acme billing".to_string());
    ingest_upload(&config, &pool, None, invoice).await.unwrap();

    let mut lease = upload_for("lease.txt", b"two");
    lease.document_name = "Lease".to_string();
    lease.category = Some("housing".to_string());
    ingest_upload(&config, &pool, None, lease).await.unwrap();

    let results = search::search_people(&pool, "acme").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].documents.len(), 1);
    assert_eq!(results[0].documents[0].document_name, "October Invoice");
}

#[tokio::test]
async fn search_is_a_read_only_projection() {
    let (_tmp, config, pool) = setup().await;

    let mut a = upload_for("a.txt", b"a");
    a.category = Some("acme".to_string());
    ingest_upload(&config, &pool, None, a).await.unwrap();
    ingest_upload(&config, &pool, None, upload_for("b.txt", b"b"))
        .await
        .unwrap();

    let full_before = search::search_people(&pool, "").await.unwrap();
    assert_eq!(full_before[0].documents.len(), 2);

    // A filtered view, twice, then the full listing again: the filtered
    // projection must never leak back into the store.
    for _ in 0..2 {
        let filtered = search::search_people(&pool, "acme").await.unwrap();
        assert_eq!(filtered[0].documents.len(), 1);
    }

    let full_after = search::search_people(&pool, "").await.unwrap();
    assert_eq!(full_after[0].documents.len(), 2);
}

#[tokio::test]
async fn people_are_listed_in_display_name_order() {
    let (_tmp, config, pool) = setup().await;

    let mut zed = upload_for("zed.txt", b"z");
    zed.unique_id = "P-010".to_string();
    zed.display_name = "Zed Zimmer".to_string();
    ingest_upload(&config, &pool, None, zed).await.unwrap();

    let mut amy = upload_for("amy.txt", b"a");
    amy.unique_id = "P-011".to_string();
    amy.display_name = "Amy Austen".to_string();
    ingest_upload(&config, &pool, None, amy).await.unwrap();

    let listing = search::list_people(&pool).await.unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].person.display_name, "Amy Austen");
    assert_eq!(listing[1].person.display_name, "Zed Zimmer");
}
