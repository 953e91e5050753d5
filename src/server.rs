//! HTTP surface.
//!
//! JSON API over the catalog and the upload pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | People + documents, optional `search` query parameter |
//! | `POST` | `/` | Multipart upload; creates the person if absent |
//! | `GET`  | `/view/{id}` | Stream the stored file inline |
//! | `POST` | `/delete/{id}` | Remove file then row |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses use the same shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "document_name must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `file_missing`
//! (500, document row exists but its file is gone; distinct from
//! `not_found`), `internal` (500). User-facing notices (upload confirmation,
//! delete warnings) ride in success bodies instead of server-side flash
//! state.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::catalog::{self, DeleteOutcome};
use crate::config::Config;
use crate::db;
use crate::ingest::{self, Upload};
use crate::migrate;
use crate::models::PersonWithDocuments;
use crate::search;
use crate::storage;
use crate::summarize::Summarizer;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    /// Built once at startup; `None` keeps the service running with
    /// placeholder descriptions.
    summarizer: Arc<Option<Summarizer>>,
}

/// Starts the HTTP server. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    tokio::fs::create_dir_all(&config.storage.upload_root).await?;

    let summarizer = Summarizer::from_config(&config.summarizer)?;
    match &summarizer {
        Some(_) => info!("summarizer client initialized"),
        None => warn!("summarizer unavailable; descriptions will be placeholders"),
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        summarizer: Arc::new(summarizer),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_index).post(handle_upload))
        .route("/view/{id}", get(handle_view))
        .route("/delete/{id}", post(handle_delete))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("dossier listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// The document row exists but its file is gone from disk. Kept distinct
/// from `not_found` so an orphaned document is diagnosable.
fn file_missing(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "file_missing".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps ingest/catalog errors to HTTP statuses by message, so the flow
/// functions can stay on plain `anyhow` errors.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("must not be empty")
        || msg.contains("not allowed")
        || msg.contains("invalid")
        || msg.contains("already exists")
    {
        bad_request(msg)
    } else {
        internal(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET / ============

#[derive(Deserialize)]
struct IndexParams {
    #[serde(default)]
    search: String,
}

#[derive(Serialize)]
struct IndexResponse {
    search_term: String,
    people: Vec<PersonEntry>,
}

#[derive(Serialize)]
struct PersonEntry {
    unique_id: String,
    display_name: String,
    documents: Vec<DocumentEntry>,
}

#[derive(Serialize)]
struct DocumentEntry {
    id: String,
    document_name: String,
    category: Option<String>,
    date_uploaded: String, // ISO8601
    description: Option<String>,
}

fn person_entry(entry: PersonWithDocuments) -> PersonEntry {
    PersonEntry {
        unique_id: entry.person.unique_id,
        display_name: entry.person.display_name,
        documents: entry
            .documents
            .into_iter()
            .map(|doc| DocumentEntry {
                id: doc.id,
                document_name: doc.document_name,
                category: doc.category,
                date_uploaded: format_ts_iso(doc.date_uploaded),
                description: doc.description,
            })
            .collect(),
    }
}

async fn handle_index(
    State(state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<Json<IndexResponse>, AppError> {
    let results = search::search_people(&state.pool, &params.search)
        .await
        .map_err(classify_error)?;

    Ok(Json(IndexResponse {
        search_term: params.search.trim().to_string(),
        people: results.into_iter().map(person_entry).collect(),
    }))
}

// ============ POST / ============

#[derive(Serialize)]
struct UploadResponse {
    status: String,
    message: String,
    document: DocumentEntry,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut unique_id = String::new();
    let mut display_name = String::new();
    let mut document_name = String::new();
    let mut category: Option<String> = None;
    let mut original_filename = String::new();
    let mut data: Vec<u8> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                original_filename = field.file_name().unwrap_or_default().to_string();
                data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("failed to read file field: {}", e)))?
                    .to_vec();
            }
            "unique_id" => unique_id = read_text_field(field).await?,
            "display_name" => display_name = read_text_field(field).await?,
            "document_name" => document_name = read_text_field(field).await?,
            "category" => category = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    if data.is_empty() && original_filename.is_empty() {
        return Err(bad_request("missing file field"));
    }

    let doc = ingest::ingest_upload(
        &state.config,
        &state.pool,
        (*state.summarizer).as_ref(),
        Upload {
            unique_id,
            display_name,
            document_name,
            category,
            original_filename,
            data,
        },
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(UploadResponse {
        status: "ok".to_string(),
        message: format!("Uploaded document: {}", doc.document_name),
        document: DocumentEntry {
            id: doc.id,
            document_name: doc.document_name,
            category: doc.category,
            date_uploaded: format_ts_iso(doc.date_uploaded),
            description: doc.description,
        },
    }))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| bad_request(format!("failed to read form field: {}", e)))
}

// ============ GET /view/{id} ============

async fn handle_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some((doc, owner)) = catalog::document_with_owner(&state.pool, &id)
        .await
        .map_err(classify_error)?
    else {
        return Err(not_found(format!("document not found: {}", id)));
    };

    let path = storage::document_path(&state.config.storage, &owner.unique_id, &doc.filename_on_disk);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(file_missing(format!(
                "stored file is missing for document {}",
                id
            )));
        }
        Err(e) => return Err(internal(e.to_string())),
    };

    let mime = storage::mime_for_filename(&doc.filename_on_disk);
    let disposition = format!("inline; filename=\"{}\"", doc.document_name.replace('"', ""));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(bytes))
        .map_err(|e| internal(e.to_string()))
}

// ============ POST /delete/{id} ============

#[derive(Serialize)]
struct DeleteResponse {
    status: String,
    message: String,
    /// Present when the row was removed but the file was already missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let outcome = catalog::delete_document(&state.pool, &state.config.storage, &id)
        .await
        .map_err(classify_error)?;

    let response = match outcome {
        DeleteOutcome::Deleted { document_name } => DeleteResponse {
            status: "ok".to_string(),
            message: format!("Successfully deleted document: {}", document_name),
            warning: None,
        },
        DeleteOutcome::DeletedFileMissing { document_name } => DeleteResponse {
            status: "ok".to_string(),
            message: format!("Successfully deleted document: {}", document_name),
            warning: Some(format!(
                "Document {} deleted from the catalog, but its file was already missing from disk.",
                document_name
            )),
        },
    };

    Ok(Json(response))
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
