//! HTTP upload server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/upload` | Multipart upload (`file` field), detect schema, commit batch |
//! | `GET`  | `/api/schemas` | Active canonical schema registry |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "unknown_format", "message": "unknown data format (confidence: 0.12)" } }
//! ```
//!
//! Error codes: `bad_request` (400), `payload_too_large` (413),
//! `unknown_format` (422), `persistence` (500).
//!
//! # Upload Limit
//!
//! `[server].max_upload_bytes` bounds the `file` field's content. The
//! request body limit adds [`MULTIPART_OVERHEAD_BYTES`] on top for
//! boundaries and part headers.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser dashboards
//! can upload directly.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use marine_ingest_core::models::ColumnMapping;
use marine_ingest_core::pipeline::{Pipeline, UploadReport};
use marine_ingest_core::schema::SchemaRegistry;
use marine_ingest_core::IngestError;

use crate::config::Config;
use crate::db;
use crate::ingest::build_pipeline;
use crate::migrate;

/// Multipart form field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// Allowance for multipart framing beyond the file content.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            max_upload_bytes: usize::MAX,
        }
    }
}

/// Build the router with all routes, CORS, tracing, and the upload size limit.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let state = AppState {
        max_upload_bytes,
        ..state
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/api/schemas", get(handle_list_schemas))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the upload server.
///
/// Connects to the database, ensures every schema table exists, and binds
/// to `[server].bind`. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool, &config.registry()).await?;

    let state = AppState::new(Arc::new(build_pipeline(config, pool)));
    let app = build_router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "upload server listening");
    println!("Upload server listening on http://{}", config.server.bind);

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

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn payload_too_large(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        code: "payload_too_large",
        message: message.into(),
    }
}

fn multipart_error(status: StatusCode, body_text: String) -> AppError {
    let message = format!("Error retrieving file: {}", body_text);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        payload_too_large(message)
    } else {
        bad_request(message)
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let (status, code) = match &err {
            IngestError::Parse(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            IngestError::UnknownFormat { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unknown_format")
            }
            IngestError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
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

// ============ GET /api/schemas ============

#[derive(Serialize)]
struct SchemaListResponse {
    schemas: SchemaRegistry,
}

async fn handle_list_schemas(State(state): State<AppState>) -> Json<SchemaListResponse> {
    Json(SchemaListResponse {
        schemas: state.pipeline.registry().clone(),
    })
}

// ============ POST /api/upload ============

/// JSON response body for a committed upload.
#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    upload_id: Uuid,
    detected_table: String,
    confidence: f64,
    rows_processed: usize,
    columns_mapped: ColumnMapping,
}

impl From<UploadReport> for UploadResponse {
    fn from(report: UploadReport) -> Self {
        Self {
            status: "success",
            upload_id: report.upload_id,
            detected_table: report.detected_table,
            confidence: report.confidence,
            rows_processed: report.rows_processed,
            columns_mapped: report.columns_mapped,
        }
    }
}

/// Handler for `POST /api/upload`.
///
/// Reads the `file` field, then parses, detects, maps, and commits it.
/// Returns `400` for multipart or parse problems, `413` when the file
/// exceeds the upload limit, `422` when no schema is confident enough, and
/// `500` when the batch could not be committed.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| multipart_error(e.status(), e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e.status(), e.body_text()))?;
        if data.len() > state.max_upload_bytes {
            return Err(payload_too_large(format!(
                "file is {} bytes, limit is {}",
                data.len(),
                state.max_upload_bytes
            )));
        }
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| {
        bad_request(format!(
            "Error retrieving file: missing form field '{}'",
            FILE_FIELD
        ))
    })?;

    let report = state.pipeline.ingest(&data, &filename).await?;
    Ok(Json(report.into()))
}
