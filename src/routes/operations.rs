//! PDF operation routes
//!
//! Every tracked operation validates its body, then hands off to the
//! orchestrator, which owns the job record. Metadata extraction is untracked.

use axum::{body::Bytes, extract::State, routing::post, Extension, Json, Router};
use serde::Serialize;

use super::json_body;
use crate::auth::CurrentUser;
use crate::db::Operation;
use crate::error::Result;
use crate::pdf::{PdfMetadata, DEFAULT_DPI};
use crate::processing;
use crate::state::AppState;
use crate::validation::validate_operation_params;

/// Response for operations producing one file
#[derive(Serialize)]
struct SingleOutputResponse {
    job_id: i64,
    message: &'static str,
    output_file: String,
}

/// Response for operations producing several files
#[derive(Serialize)]
struct MultiOutputResponse {
    job_id: i64,
    message: &'static str,
    output_files: Vec<String>,
}

#[derive(Serialize)]
struct CompressResponse {
    job_id: i64,
    message: &'static str,
    output_file: String,
    original_size: u64,
    compressed_size: u64,
    compression_ratio: f64,
}

#[derive(Serialize)]
struct MetadataResponse {
    message: &'static str,
    metadata: PdfMetadata,
}

/// Create the operations router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/merge", post(merge_pdfs))
        .route("/split", post(split_pdf))
        .route("/convert-to-images", post(convert_to_images))
        .route("/compress", post(compress_pdf))
        .route("/metadata", post(extract_metadata))
}

/// POST /api/merge
async fn merge_pdfs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<SingleOutputResponse>> {
    let params = validate_operation_params(&json_body(&body)?, &["files"])?;
    let files = params.files()?.to_vec();
    let inputs = files.clone();

    let outcome = processing::run_job(&state, &user, Operation::Merge, files, move |engine| {
        engine.merge(&inputs)
    })
    .await?;

    Ok(Json(SingleOutputResponse {
        job_id: outcome.job.id,
        message: "PDFs merged successfully",
        output_file: outcome.output,
    }))
}

/// POST /api/split
async fn split_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<MultiOutputResponse>> {
    let params = validate_operation_params(&json_body(&body)?, &["file"])?;
    let file = params.file()?.to_string();
    let range = params.pages;

    let input = file.clone();
    let outcome = processing::run_job(&state, &user, Operation::Split, vec![file], move |engine| {
        engine.split(&input, range)
    })
    .await?;

    Ok(Json(MultiOutputResponse {
        job_id: outcome.job.id,
        message: "PDF split successfully",
        output_files: outcome.output,
    }))
}

/// POST /api/convert-to-images
async fn convert_to_images(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<MultiOutputResponse>> {
    let params = validate_operation_params(&json_body(&body)?, &["file"])?;
    let file = params.file()?.to_string();
    let format = params.format.unwrap_or_default();
    let dpi = params.dpi.unwrap_or(DEFAULT_DPI);

    let input = file.clone();
    let outcome = processing::run_job(
        &state,
        &user,
        Operation::ConvertToImages,
        vec![file],
        move |engine| engine.convert_to_images(&input, format, dpi),
    )
    .await?;

    Ok(Json(MultiOutputResponse {
        job_id: outcome.job.id,
        message: "PDF converted to images successfully",
        output_files: outcome.output,
    }))
}

/// POST /api/compress
async fn compress_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<CompressResponse>> {
    let params = validate_operation_params(&json_body(&body)?, &["file"])?;
    let file = params.file()?.to_string();
    let quality = params.quality.unwrap_or_default();

    let input = file.clone();
    let outcome = processing::run_job(&state, &user, Operation::Compress, vec![file], move |engine| {
        engine.compress(&input, quality)
    })
    .await?;

    let job_id = outcome.job.id;
    let result = outcome.output;

    Ok(Json(CompressResponse {
        job_id,
        message: "PDF compressed successfully",
        output_file: result.output_file,
        original_size: result.original_size,
        compressed_size: result.compressed_size,
        compression_ratio: result.compression_ratio,
    }))
}

/// POST /api/metadata
async fn extract_metadata(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<MetadataResponse>> {
    let params = validate_operation_params(&json_body(&body)?, &["file"])?;
    let file = params.file()?.to_string();

    tracing::debug!(user_id = user.id, file = %file, "Extracting metadata");
    let metadata = processing::execute(&state, move |engine| engine.extract_metadata(&file)).await?;

    Ok(Json(MetadataResponse {
        message: "Metadata extracted successfully",
        metadata,
    }))
}
