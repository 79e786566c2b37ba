//! Job status route

use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::processing::{job_status, JobView};
use crate::state::AppState;

/// Create the job status router
pub fn router() -> Router<AppState> {
    Router::new().route("/status/:job_id", get(get_job_status))
}

/// GET /api/status/:job_id
async fn get_job_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobView>> {
    let view = job_status(state.db(), &user, job_id).await?;
    Ok(Json(view))
}
