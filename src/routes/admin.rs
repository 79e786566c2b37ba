//! Admin maintenance routes

use std::time::Duration;

use axum::{body::Bytes, extract::State, routing::post, Extension, Json, Router};
use serde::Serialize;
use serde_json::Value;

use super::json_body;
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Default age threshold for cleanup, in hours
pub const DEFAULT_CLEANUP_HOURS: u64 = 24;

#[derive(Serialize)]
struct CleanupResponse {
    message: &'static str,
    files_cleaned: usize,
}

/// Create the admin router
pub fn router() -> Router<AppState> {
    Router::new().route("/cleanup", post(cleanup_files))
}

fn cleanup_hours(body: &Value) -> Result<u64> {
    match body.get("hours") {
        None | Some(Value::Null) => Ok(DEFAULT_CLEANUP_HOURS),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| AppError::invalid_parameter("hours", "Hours must be a non-negative integer")),
    }
}

/// POST /api/cleanup
///
/// Delete uploads and outputs older than `hours` (default 24). Admin only.
async fn cleanup_files(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<CleanupResponse>> {
    if !user.is_admin {
        tracing::warn!(user_id = user.id, "Non-admin cleanup attempt");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let hours = cleanup_hours(&json_body(&body)?)?;
    let max_age = Duration::from_secs(hours.saturating_mul(3600));
    let store = state.store().clone();

    let files_cleaned = tokio::task::spawn_blocking(move || store.remove_older_than(max_age))
        .await
        .map_err(|e| AppError::Internal(format!("Cleanup task failed: {}", e)))??;

    tracing::info!(user_id = user.id, hours, files_cleaned, "Cleanup requested");
    Ok(Json(CleanupResponse {
        message: "Cleanup completed successfully",
        files_cleaned,
    }))
}
