//! Processing job ledger
//!
//! Jobs are created in `processing` and move exactly once to `completed` or
//! `failed`. Terminal updates are conditional on the current status, so a
//! second transition affects no row and is reported as an error.

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};

/// Operation that produced a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Merge,
    Split,
    ConvertToImages,
    Compress,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Merge => "merge",
            Operation::Split => "split",
            Operation::ConvertToImages => "convert_to_images",
            Operation::Compress => "compress",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "merge" => Some(Operation::Merge),
            "split" => Some(Operation::Split),
            "convert_to_images" => Some(Operation::ConvertToImages),
            "compress" => Some(Operation::Compress),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// A persisted processing job
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingJob {
    pub id: i64,
    pub user_id: i64,
    pub operation: Operation,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Raw `processing_jobs` row
#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    user_id: i64,
    operation: String,
    input_files: String,
    output_files: String,
    status: String,
    error_message: Option<String>,
    created_at: String,
    completed_at: Option<String>,
}

impl TryFrom<JobRow> for ProcessingJob {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self> {
        let id = row.id;
        let corrupt = move |what: &str| AppError::Internal(format!("Job {} has invalid {}", id, what));

        Ok(ProcessingJob {
            id: row.id,
            user_id: row.user_id,
            operation: Operation::parse(&row.operation).ok_or_else(|| corrupt("operation"))?,
            input_files: serde_json::from_str(&row.input_files).map_err(|_| corrupt("input_files"))?,
            output_files: serde_json::from_str(&row.output_files).map_err(|_| corrupt("output_files"))?,
            status: JobStatus::parse(&row.status).ok_or_else(|| corrupt("status"))?,
            error_message: row.error_message,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

fn encode_files(files: &[String]) -> Result<String> {
    serde_json::to_string(files).map_err(|e| AppError::Internal(format!("Failed to encode file list: {}", e)))
}

/// Job repository
pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a job by id
    pub async fn get(&self, id: i64) -> Result<Option<ProcessingJob>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, user_id, operation, input_files, output_files, status,
                   error_message, created_at, completed_at
            FROM processing_jobs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProcessingJob::try_from).transpose()
    }

    /// Record a new job in `processing` for `user_id`
    pub async fn create(
        &self,
        user_id: i64,
        operation: Operation,
        input_files: &[String],
    ) -> Result<ProcessingJob> {
        if input_files.is_empty() {
            return Err(AppError::Internal("A job needs at least one input file".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO processing_jobs (user_id, operation, input_files, output_files, status, created_at)
            VALUES (?, ?, ?, '[]', ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(operation.as_str())
        .bind(encode_files(input_files)?)
        .bind(JobStatus::Processing.as_str())
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created job".to_string()))
    }

    /// Move a processing job to `completed` with its outputs
    pub async fn complete(&self, id: i64, output_files: &[String]) -> Result<ProcessingJob> {
        if output_files.is_empty() {
            return Err(AppError::Internal(format!(
                "Job {} cannot complete without output files",
                id
            )));
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE processing_jobs
            SET status = ?, output_files = ?, completed_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(JobStatus::Completed.as_str())
        .bind(encode_files(output_files)?)
        .bind(&now)
        .bind(id)
        .bind(JobStatus::Processing.as_str())
        .execute(self.pool)
        .await?;

        self.finish(id, result.rows_affected()).await
    }

    /// Move a processing job to `failed` with an error description
    ///
    /// `completed_at` stays unset; it marks successful completion only.
    pub async fn fail(&self, id: i64, error_message: &str) -> Result<ProcessingJob> {
        let result = sqlx::query(
            r#"
            UPDATE processing_jobs
            SET status = ?, output_files = '[]', error_message = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(JobStatus::Failed.as_str())
        .bind(error_message)
        .bind(id)
        .bind(JobStatus::Processing.as_str())
        .execute(self.pool)
        .await?;

        self.finish(id, result.rows_affected()).await
    }

    async fn finish(&self, id: i64, rows_affected: u64) -> Result<ProcessingJob> {
        let job = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", id)))?;

        if rows_affected == 0 {
            return Err(AppError::Internal(format!(
                "Job {} is {}, not processing",
                id,
                job.status.as_str()
            )));
        }

        Ok(job)
    }
}
