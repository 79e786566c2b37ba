//! Upload and download routes

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::Zone;
use crate::validation::{validate_pdf_upload, MAX_FILE_SIZE};

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    filename: String,
    size: usize,
    pages: usize,
}

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route("/download/:filename", get(download_file))
}

/// POST /api/upload
///
/// Accepts a multipart form with a `file` field holding a PDF.
async fn upload_file(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        let upload = validate_pdf_upload(original_name.as_deref(), &data)?;
        let filename = state
            .store()
            .store_upload(original_name.as_deref().unwrap_or("upload.pdf"), &data)
            .await?;

        tracing::info!(
            user_id = user.id,
            filename = %filename,
            size = upload.size,
            pages = upload.pages,
            "File uploaded"
        );

        return Ok(Json(UploadResponse {
            message: "File uploaded successfully",
            filename,
            size: upload.size,
            pages: upload.pages,
        }));
    }

    Err(AppError::InvalidInput("No file provided".to_string()))
}

/// GET /api/download/:filename
///
/// Serves a processed artifact as an attachment.
async fn download_file(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let store = state.store();
    if store.resolve(Zone::Processed, &filename).is_none() {
        return Err(AppError::FileNotFound(filename));
    }

    // The file may vanish between the check and the read
    let bytes = store.read_processed(&filename).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::FileNotFound(filename.clone()),
        _ => AppError::Io(e),
    })?;

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
    tracing::debug!(user_id = user.id, filename = %filename, size = bytes.len(), "Serving download");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
