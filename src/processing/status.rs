//! Job status query

use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::{JobRepository, JobStatus, Operation, ProcessingJob};
use crate::error::{AppError, Result};

/// Job as reported to its owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub job_id: i64,
    pub operation: Operation,
    pub status: JobStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Present only for completed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_files: Option<Vec<String>>,
    /// Present only for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ProcessingJob> for JobView {
    fn from(job: ProcessingJob) -> Self {
        JobView {
            job_id: job.id,
            operation: job.operation,
            status: job.status,
            created_at: job.created_at,
            completed_at: job.completed_at,
            output_files: (job.status == JobStatus::Completed).then_some(job.output_files),
            error: job.error_message.filter(|_| job.status == JobStatus::Failed),
        }
    }
}

/// Look up a job on behalf of `user`; other users' jobs are forbidden.
pub async fn job_status(db: &SqlitePool, user: &CurrentUser, job_id: i64) -> Result<JobView> {
    let job = JobRepository::new(db)
        .get(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", job_id)))?;

    if job.user_id != user.id {
        tracing::warn!(job_id, owner = job.user_id, requester = user.id, "Job access denied");
        return Err(AppError::Forbidden("Job belongs to another user".to_string()));
    }

    Ok(job.into())
}
